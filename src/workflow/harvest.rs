use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::ticket::CorpusRecord;
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Built-in harvest filter: only resolved tickets with both classification
/// fields present make useful corpus rows.
pub const HARVEST_FILTER: &str = "AND resolution = \"Done\" \
     AND resolutiondate >= -360d \
     AND Team is not EMPTY \
     AND component is not EMPTY";

/// Collect up to `per_project_cap` transformed records for each project, in
/// project order. A failing project is logged and skipped; records collected
/// before the failure are kept.
pub async fn harvest(
    tracker: &dyn IssueTrackerService,
    project_keys: &[String],
    extra_filter: &str,
    per_project_cap: usize,
    page_size: usize,
) -> Vec<CorpusRecord> {
    let mut corpus = Vec::new();
    for project_key in project_keys {
        let before = corpus.len();
        match collect_project(
            tracker,
            project_key,
            extra_filter,
            per_project_cap,
            page_size,
            &mut corpus,
        )
        .await
        {
            Ok(()) => {
                info!(
                    project = %project_key,
                    collected = corpus.len() - before,
                    "harvested project"
                );
            }
            Err(err) => {
                warn!(project = %project_key, error = %err, "error fetching issues, skipping project");
            }
        }
    }
    corpus
}

async fn collect_project(
    tracker: &dyn IssueTrackerService,
    project_key: &str,
    extra_filter: &str,
    per_project_cap: usize,
    page_size: usize,
    corpus: &mut Vec<CorpusRecord>,
) -> AppResult<()> {
    let jql = format!("project = \"{project_key}\" {extra_filter}")
        .trim()
        .to_string();
    let cap = corpus.len() + per_project_cap;
    let mut start_at = 0;
    let mut total = None;

    while total.map_or(true, |total| start_at < total) && corpus.len() < cap {
        let requested = page_size.min(cap - corpus.len());
        let page = tracker.search(&jql, start_at, requested).await?;
        if total.is_none() {
            total = Some(page.total);
        }

        let count = page.tickets.len();
        for ticket in page.tickets {
            corpus.push(CorpusRecord::from(ticket));
            if corpus.len() >= cap {
                break;
            }
        }

        // A server that misreports its total must not spin the loop forever.
        if count == 0 {
            break;
        }
        start_at += requested;
    }
    Ok(())
}

/// Overwrite the corpus file wholesale with a pretty-printed JSON array.
pub fn write_corpus(path: &Path, records: &[CorpusRecord]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let data = serde_json::to_string_pretty(records)
        .map_err(|err| AppError::Configuration(format!("failed to serialize corpus: {err}")))?;
    fs::write(path, data)?;
    Ok(())
}
