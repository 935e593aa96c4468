use serde_json::{Map, Value, json};

use crate::domain::triage::{ApprovedChange, FieldUpdateResult};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

/// Apply approved changes one at a time, producing one result per change in
/// input order. A failure on one change never stops the rest of the batch,
/// and nothing already written is rolled back.
pub async fn apply_changes(
    tracker: &dyn IssueTrackerService,
    team_id_map: Option<&str>,
    changes: &[ApprovedChange],
) -> Vec<FieldUpdateResult> {
    let mut results = Vec::with_capacity(changes.len());
    for change in changes {
        results.push(apply_change(tracker, team_id_map, change).await);
    }
    results
}

async fn apply_change(
    tracker: &dyn IssueTrackerService,
    team_id_map: Option<&str>,
    change: &ApprovedChange,
) -> FieldUpdateResult {
    if change.is_empty() {
        return FieldUpdateResult::success("no changes to apply", Map::new());
    }

    let mut details = Map::new();
    if !change.team.is_empty() {
        let team_id = match resolve_team_id(team_id_map, &change.team) {
            Ok(team_id) => team_id,
            Err(err) => return FieldUpdateResult::failure(format!("update failed: {err}")),
        };
        if let Err(err) = tracker.set_team(&change.key, &team_id).await {
            return FieldUpdateResult::failure(format!("update failed: {err}"));
        }
        details.insert("team".to_string(), team_id);
    }

    if !change.component.is_empty() {
        let components = std::slice::from_ref(&change.component);
        if let Err(err) = tracker.set_components(&change.key, components).await {
            return FieldUpdateResult::failure(format!("update failed: {err}"));
        }
        details.insert("components".to_string(), json!([{ "name": change.component }]));
    }

    FieldUpdateResult::success("updated", details)
}

/// Translate a human-readable team name into the tracker-internal identifier
/// via the configured JSON table. The table being absent, unparseable, or
/// missing the name fails only the change being applied.
pub fn resolve_team_id(team_id_map: Option<&str>, team: &str) -> AppResult<Value> {
    let raw = team_id_map
        .ok_or_else(|| AppError::Configuration("TEAM_ID_MAP is not configured".to_string()))?;
    let table: Map<String, Value> = serde_json::from_str(raw)
        .map_err(|err| AppError::Configuration(format!("invalid TEAM_ID_MAP: {err}")))?;
    table
        .get(team)
        .cloned()
        .ok_or_else(|| AppError::Configuration(format!("team '{team}' not found in TEAM_ID_MAP")))
}
