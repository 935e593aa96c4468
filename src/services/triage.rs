use async_trait::async_trait;

use crate::domain::ticket::TicketRecord;
use crate::domain::triage::Prediction;
use crate::error::AppResult;

/// The single call boundary to the external prediction agent. Implementations
/// own prompt construction and transport; callers see only the prediction.
#[async_trait]
pub trait TriageService: Send + Sync {
    async fn triage(&self, ticket: &TicketRecord) -> AppResult<Prediction>;
}
