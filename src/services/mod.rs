pub mod issue_tracker;
pub mod triage;

pub use issue_tracker::{IssueTrackerService, SearchPage};
pub use triage::TriageService;
