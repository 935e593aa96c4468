use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ticket::TicketRecord;
use crate::error::AppResult;

/// One page of a tracker search: the records for the requested window plus
/// the total match count across all pages.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub total: usize,
    pub tickets: Vec<TicketRecord>,
}

#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    /// Run a JQL query, returning at most `max_results` records starting at
    /// offset `start_at`.
    async fn search(&self, jql: &str, start_at: usize, max_results: usize)
    -> AppResult<SearchPage>;

    /// Fetch a single issue by key as a canonical ticket record.
    async fn fetch_ticket(&self, key: &str) -> AppResult<TicketRecord>;

    /// Write the team field. The payload is the tracker-internal identifier,
    /// not the human-readable team name.
    async fn set_team(&self, key: &str, team_id: &Value) -> AppResult<()>;

    /// Write the components field as a list of component names.
    async fn set_components(&self, key: &str, components: &[String]) -> AppResult<()>;
}
