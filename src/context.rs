use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{IssueTrackerService, TriageService};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub issue_tracker: Arc<dyn IssueTrackerService>,
    pub triager: Arc<dyn TriageService>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        issue_tracker: Arc<dyn IssueTrackerService>,
        triager: Arc<dyn TriageService>,
    ) -> Self {
        Self {
            config,
            issue_tracker,
            triager,
        }
    }
}
