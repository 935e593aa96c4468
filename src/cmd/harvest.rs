use std::path::PathBuf;

use clap::Args;

use crate::config::parse_projects;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::workflow::harvest::{DEFAULT_PAGE_SIZE, HARVEST_FILTER, harvest, write_corpus};

#[derive(Args, Debug, Clone)]
pub struct HarvestArgs {
    /// Comma-separated project keys (defaults to the configured projects).
    #[arg(long)]
    pub projects: Option<String>,
    /// Extra JQL appended to the built-in harvest filter.
    #[arg(long, default_value = "")]
    pub jql_extra: String,
    /// Maximum number of issues collected per project.
    #[arg(long, default_value_t = 50)]
    pub per_project: usize,
    /// Where to write the knowledge corpus.
    #[arg(long, default_value = "tmp/knowledge_base.json")]
    pub output: PathBuf,
}

pub async fn run(ctx: &AppContext, args: HarvestArgs) -> AppResult<()> {
    let projects = match &args.projects {
        Some(raw) => parse_projects(raw),
        None => ctx.config.projects.clone(),
    };
    if projects.is_empty() {
        return Err(AppError::Configuration(
            "no projects configured; pass --projects or set TRIAGE_PROJECTS".to_string(),
        ));
    }

    let extra_filter = format!("{} {}", args.jql_extra.trim(), HARVEST_FILTER)
        .trim()
        .to_string();
    let records = harvest(
        ctx.issue_tracker.as_ref(),
        &projects,
        &extra_filter,
        args.per_project,
        DEFAULT_PAGE_SIZE,
    )
    .await;

    write_corpus(&args.output, &records)?;
    println!(
        "Successfully wrote {} issues to {}",
        records.len(),
        args.output.display()
    );
    Ok(())
}
