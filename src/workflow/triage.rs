use tracing::warn;

use crate::context::AppContext;
use crate::domain::ticket::{TicketOverrides, TicketRecord, resolve_ticket};
use crate::domain::triage::Prediction;
use crate::error::AppResult;

/// A ticket paired with the agent's recommendation for it.
#[derive(Debug, Clone)]
pub struct TriageOutcome {
    pub ticket: TicketRecord,
    pub prediction: Prediction,
}

/// Rendered cells for one row of the queue-triage table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRow {
    pub key: String,
    pub team: String,
    pub component: String,
    pub confidence: String,
}

/// Triage one ticket by key. A fetch failure here is fatal: the caller asked
/// for this specific ticket.
pub async fn triage_single(
    ctx: &AppContext,
    key: &str,
    overrides: &TicketOverrides,
) -> AppResult<TriageOutcome> {
    let fetched = ctx.issue_tracker.fetch_ticket(key).await?;
    let ticket = resolve_ticket(&fetched, overrides);
    let prediction = ctx.triager.triage(&ticket).await?;
    Ok(TriageOutcome { ticket, prediction })
}

/// Triage a ticket described entirely by caller-supplied fields, with nothing
/// fetched from the tracker.
pub async fn triage_manual(
    ctx: &AppContext,
    overrides: &TicketOverrides,
) -> AppResult<TriageOutcome> {
    let ticket = resolve_ticket(&TicketRecord::default(), overrides);
    let prediction = ctx.triager.triage(&ticket).await?;
    Ok(TriageOutcome { ticket, prediction })
}

/// Run the triage queue: search with the standing filter, predict per ticket.
/// A prediction failure skips that ticket and keeps going.
pub async fn triage_queue(ctx: &AppContext, max_issues: usize) -> AppResult<Vec<TriageOutcome>> {
    let jql = triage_queue_jql(&ctx.config.projects);
    let page = ctx.issue_tracker.search(&jql, 0, max_issues).await?;

    let mut outcomes = Vec::new();
    for ticket in page.tickets {
        match ctx.triager.triage(&ticket).await {
            Ok(prediction) => outcomes.push(TriageOutcome { ticket, prediction }),
            Err(err) => {
                warn!(key = %ticket.key, error = %err, "skipping ticket after triage failure");
            }
        }
    }
    Ok(outcomes)
}

/// Standing filter for tickets that still need triage: open, missing a team
/// or component, and of a type an operator would actually classify.
pub fn triage_queue_jql(projects: &[String]) -> String {
    let scope = if projects.is_empty() {
        String::new()
    } else {
        let joined = projects
            .iter()
            .map(|project| format!("\"{project}\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!("project in ({joined}) AND ")
    };
    format!(
        "{scope}status != closed \
         AND (Team is EMPTY OR component is EMPTY) \
         AND issuetype not in (Sub-task, Epic, Feature, \"Feature Request\", Outcome) \
         ORDER BY created DESC, priority DESC"
    )
}

/// Table cells for one outcome: predictions shown outright, fields that are
/// already set shown as "Assigned", confidence only where it means something.
pub fn queue_row(outcome: &TriageOutcome) -> QueueRow {
    let assigned_cell = |predicted: &str, current: &str| {
        if !predicted.is_empty() {
            predicted.to_string()
        } else if !current.is_empty() {
            "Assigned".to_string()
        } else {
            String::new()
        }
    };

    let confidence = if outcome.prediction.has_recommendation() {
        format!("{:.2}", outcome.prediction.confidence)
    } else if !outcome.ticket.team.is_empty() && !outcome.ticket.component.is_empty() {
        "N/A".to_string()
    } else {
        String::new()
    };

    QueueRow {
        key: outcome.ticket.key.clone(),
        team: assigned_cell(&outcome.prediction.team, &outcome.ticket.team),
        component: assigned_cell(&outcome.prediction.component, &outcome.ticket.component),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::config::AppConfig;
    use crate::error::AppError;
    use crate::services::{IssueTrackerService, SearchPage, TriageService};

    struct StubTracker {
        ticket: Option<TicketRecord>,
        queue: Vec<TicketRecord>,
    }

    #[async_trait]
    impl IssueTrackerService for StubTracker {
        async fn search(
            &self,
            _jql: &str,
            _start_at: usize,
            _max_results: usize,
        ) -> AppResult<SearchPage> {
            Ok(SearchPage {
                total: self.queue.len(),
                tickets: self.queue.clone(),
            })
        }

        async fn fetch_ticket(&self, key: &str) -> AppResult<TicketRecord> {
            self.ticket
                .clone()
                .ok_or_else(|| AppError::IssueTracker(format!("could not fetch issue {key}")))
        }

        async fn set_team(&self, _key: &str, _team_id: &Value) -> AppResult<()> {
            unreachable!("triage never writes")
        }

        async fn set_components(&self, _key: &str, _components: &[String]) -> AppResult<()> {
            unreachable!("triage never writes")
        }
    }

    struct StubTriager {
        prediction: Prediction,
        fail_for: Option<String>,
        seen: Mutex<Vec<TicketRecord>>,
    }

    impl StubTriager {
        fn new(prediction: Prediction) -> Self {
            Self {
                prediction,
                fail_for: None,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TriageService for StubTriager {
        async fn triage(&self, ticket: &TicketRecord) -> AppResult<Prediction> {
            if self.fail_for.as_deref() == Some(ticket.key.as_str()) {
                return Err(AppError::Triage("agent unavailable".to_string()));
            }
            self.seen.lock().unwrap().push(ticket.clone());
            Ok(self.prediction.clone())
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            jira_base_url: Some("https://tracker.example.com".to_string()),
            jira_email: None,
            jira_token: None,
            jira_team_field: "customfield_12313240".to_string(),
            projects: vec!["SUPP".to_string(), "CORE".to_string()],
            gemini_api_key: None,
            gemini_model: None,
            team_id_map: None,
        }
    }

    fn context(tracker: StubTracker, triager: Arc<StubTriager>) -> AppContext {
        AppContext::new(test_config(), Arc::new(tracker), triager)
    }

    fn ticket(key: &str, team: &str, component: &str) -> TicketRecord {
        TicketRecord {
            key: key.to_string(),
            title: format!("title {key}"),
            team: team.to_string(),
            component: component.to_string(),
            ..TicketRecord::default()
        }
    }

    #[tokio::test]
    async fn single_triage_applies_overrides_before_predicting() {
        let tracker = StubTracker {
            ticket: Some(ticket("SUPP-1", "Core", "UI")),
            queue: vec![],
        };
        let triager = Arc::new(StubTriager::new(Prediction::new(
            "Install".to_string(),
            String::new(),
            0.7,
        )));
        let ctx = context(tracker, Arc::clone(&triager));

        let overrides = TicketOverrides {
            team: Some("".to_string()),
            ..TicketOverrides::default()
        };
        let outcome = triage_single(&ctx, "SUPP-1", &overrides).await.unwrap();

        assert_eq!(outcome.ticket.team, "");
        assert_eq!(outcome.prediction.team, "Install");
        let seen = triager.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].team, "");
        assert_eq!(seen[0].component, "UI");
    }

    #[tokio::test]
    async fn manual_triage_uses_only_caller_fields() {
        let tracker = StubTracker {
            ticket: None,
            queue: vec![],
        };
        let triager = Arc::new(StubTriager::new(Prediction::new(
            "Docs".to_string(),
            String::new(),
            0.4,
        )));
        let ctx = context(tracker, Arc::clone(&triager));

        let overrides = TicketOverrides {
            title: Some("Password reset fails".to_string()),
            description: Some("Reset link returns 500".to_string()),
            ..TicketOverrides::default()
        };
        let outcome = triage_manual(&ctx, &overrides).await.unwrap();

        assert_eq!(outcome.ticket.key, "");
        assert_eq!(outcome.ticket.title, "Password reset fails");
        assert_eq!(outcome.prediction.team, "Docs");
    }

    #[tokio::test]
    async fn single_triage_fetch_failure_is_fatal() {
        let tracker = StubTracker {
            ticket: None,
            queue: vec![],
        };
        let triager = Arc::new(StubTriager::new(Prediction::default()));
        let ctx = context(tracker, triager);

        let err = triage_single(&ctx, "SUPP-404", &TicketOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IssueTracker(_)));
    }

    #[tokio::test]
    async fn queue_skips_tickets_whose_prediction_fails() {
        let tracker = StubTracker {
            ticket: None,
            queue: vec![
                ticket("SUPP-1", "", ""),
                ticket("SUPP-2", "", ""),
                ticket("SUPP-3", "", ""),
            ],
        };
        let mut triager = StubTriager::new(Prediction::new("Core".to_string(), String::new(), 0.6));
        triager.fail_for = Some("SUPP-2".to_string());
        let ctx = context(tracker, Arc::new(triager));

        let outcomes = triage_queue(&ctx, 20).await.unwrap();
        let keys: Vec<&str> = outcomes
            .iter()
            .map(|outcome| outcome.ticket.key.as_str())
            .collect();
        assert_eq!(keys, vec!["SUPP-1", "SUPP-3"]);
    }

    #[test]
    fn queue_jql_scopes_to_configured_projects() {
        let jql = triage_queue_jql(&["SUPP".to_string(), "CORE".to_string()]);
        assert!(jql.starts_with("project in (\"SUPP\", \"CORE\") AND status != closed"));
        assert!(jql.ends_with("ORDER BY created DESC, priority DESC"));

        let unscoped = triage_queue_jql(&[]);
        assert!(unscoped.starts_with("status != closed"));
    }

    #[test]
    fn queue_row_prefers_prediction_then_assignment_marker() {
        let predicted = TriageOutcome {
            ticket: ticket("SUPP-1", "Core", ""),
            prediction: Prediction::new(String::new(), "UI".to_string(), 0.42),
        };
        let row = queue_row(&predicted);
        assert_eq!(row.team, "Assigned");
        assert_eq!(row.component, "UI");
        assert_eq!(row.confidence, "0.42");
    }

    #[test]
    fn queue_row_marks_fully_assigned_tickets() {
        let assigned = TriageOutcome {
            ticket: ticket("SUPP-2", "Core", "UI"),
            prediction: Prediction::default(),
        };
        let row = queue_row(&assigned);
        assert_eq!(row.team, "Assigned");
        assert_eq!(row.component, "Assigned");
        assert_eq!(row.confidence, "N/A");
    }

    #[test]
    fn queue_row_is_blank_without_prediction_or_assignment() {
        let blank = TriageOutcome {
            ticket: ticket("SUPP-3", "", ""),
            prediction: Prediction::default(),
        };
        let row = queue_row(&blank);
        assert_eq!(row.team, "");
        assert_eq!(row.component, "");
        assert_eq!(row.confidence, "");
    }
}
