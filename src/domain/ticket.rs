use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical view of one tracker issue. Every field defaults to an empty
/// string so downstream formatting never has to branch on missing values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketRecord {
    pub key: String,
    pub title: String,
    pub description: String,
    pub component: String,
    pub team: String,
    pub assignee: String,
    pub project_key: String,
}

/// Caller-supplied field overrides. `None` means "use the fetched value";
/// a blank string is a deliberate clear, not an absent override.
#[derive(Debug, Clone, Default)]
pub struct TicketOverrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub component: Option<String>,
    pub team: Option<String>,
    pub assignee: Option<String>,
    pub project_key: Option<String>,
}

/// One row of the persisted knowledge corpus. Field order here is the
/// serialization order of the corpus file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusRecord {
    pub title: String,
    pub key: String,
    pub component: String,
    pub description: String,
    pub team: String,
}

impl From<TicketRecord> for CorpusRecord {
    fn from(ticket: TicketRecord) -> Self {
        Self {
            title: ticket.title,
            key: ticket.key,
            component: ticket.component,
            description: ticket.description,
            team: ticket.team,
        }
    }
}

/// Strip tracker no-format markers, normalize line endings to `\n`, and trim
/// surrounding whitespace. Idempotent.
pub fn normalize_description(raw: &str) -> String {
    let cleaned = raw.replace("{noformat}", "");
    let cleaned = cleaned.replace("\r\n", "\n").replace('\r', "\n");
    cleaned.trim().to_string()
}

/// Merge one override with its fetched value. An absent override keeps the
/// fetched value; a blank override clears the field; anything else wins as
/// given.
pub fn resolve_field(override_value: Option<&str>, fetched: &str) -> String {
    match override_value {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        Some(_) => String::new(),
        None => fetched.to_string(),
    }
}

/// Apply the override precedence rule field by field. The fetched component
/// is expected to already be collapsed to a single name upstream.
pub fn resolve_ticket(fetched: &TicketRecord, overrides: &TicketOverrides) -> TicketRecord {
    TicketRecord {
        key: fetched.key.clone(),
        title: resolve_field(overrides.title.as_deref(), &fetched.title),
        description: resolve_field(overrides.description.as_deref(), &fetched.description),
        component: resolve_field(overrides.component.as_deref(), &fetched.component),
        team: resolve_field(overrides.team.as_deref(), &fetched.team),
        assignee: resolve_field(overrides.assignee.as_deref(), &fetched.assignee),
        project_key: resolve_field(overrides.project_key.as_deref(), &fetched.project_key),
    }
}

/// Decode the tracker's team custom field, which arrives either as an object
/// carrying a `name` or as a bare string. Anything else maps to the empty
/// string.
pub fn team_field_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::Object(map)) => map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::String(name)) => name.clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_override_keeps_fetched_value() {
        assert_eq!(resolve_field(None, "Frontend"), "Frontend");
        assert_eq!(resolve_field(None, ""), "");
    }

    #[test]
    fn blank_override_clears_the_field() {
        assert_eq!(resolve_field(Some(""), "Frontend"), "");
        assert_eq!(resolve_field(Some("   "), "Frontend"), "");
    }

    #[test]
    fn non_blank_override_wins_verbatim() {
        assert_eq!(resolve_field(Some("Install"), "Frontend"), "Install");
        assert_eq!(resolve_field(Some(" Install "), "Frontend"), " Install ");
    }

    #[test]
    fn resolves_ticket_field_by_field() {
        let fetched = TicketRecord {
            key: "PROJ-1".to_string(),
            title: "Login fails".to_string(),
            description: "stack trace".to_string(),
            component: "Authentication".to_string(),
            team: "Core".to_string(),
            assignee: "Sam Doe".to_string(),
            project_key: "PROJ".to_string(),
        };
        let overrides = TicketOverrides {
            title: Some("Password reset fails".to_string()),
            team: Some("".to_string()),
            ..TicketOverrides::default()
        };

        let resolved = resolve_ticket(&fetched, &overrides);
        assert_eq!(resolved.key, "PROJ-1");
        assert_eq!(resolved.title, "Password reset fails");
        assert_eq!(resolved.description, "stack trace");
        assert_eq!(resolved.component, "Authentication");
        assert_eq!(resolved.team, "");
        assert_eq!(resolved.assignee, "Sam Doe");
    }

    #[test]
    fn normalizes_markers_and_line_endings() {
        let raw = "  {noformat}error{noformat}\r\nline two\rline three  ";
        assert_eq!(normalize_description(raw), "error\nline two\nline three");
    }

    #[test]
    fn normalize_description_is_idempotent() {
        let raw = "{noformat}first{noformat}\r\nsecond\r";
        let once = normalize_description(raw);
        assert_eq!(normalize_description(&once), once);
    }

    #[test]
    fn empty_description_stays_empty() {
        assert_eq!(normalize_description(""), "");
    }

    #[test]
    fn decodes_team_field_shapes_in_priority_order() {
        let object = json!({"name": "Install", "id": 42});
        assert_eq!(team_field_name(Some(&object)), "Install");
        let bare = json!("Install");
        assert_eq!(team_field_name(Some(&bare)), "Install");
        let nameless = json!({"id": 42});
        assert_eq!(team_field_name(Some(&nameless)), "");
        assert_eq!(team_field_name(Some(&json!(17))), "");
        assert_eq!(team_field_name(None), "");
    }

    #[test]
    fn corpus_record_takes_ticket_fields() {
        let ticket = TicketRecord {
            key: "PROJ-9".to_string(),
            title: "Crash on start".to_string(),
            description: "boom".to_string(),
            component: "Core platform".to_string(),
            team: "Runtime".to_string(),
            ..TicketRecord::default()
        };
        let record = CorpusRecord::from(ticket);
        assert_eq!(record.key, "PROJ-9");
        assert_eq!(record.team, "Runtime");
        assert_eq!(record.component, "Core platform");
    }
}
