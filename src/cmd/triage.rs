use clap::Args;

use crate::context::AppContext;
use crate::domain::ticket::TicketOverrides;
use crate::error::AppResult;
use crate::workflow::triage::{
    TriageOutcome, queue_row, triage_manual, triage_queue, triage_single,
};

#[derive(Args, Debug, Clone)]
pub struct TriageArgs {
    /// Issue key (e.g. PROJ-6496). Omit to triage the whole filtered queue.
    pub key: Option<String>,
    /// Title of the issue (overrides the fetched title).
    #[arg(long)]
    pub title: Option<String>,
    /// Description of the issue (overrides the fetched description).
    #[arg(long)]
    pub description: Option<String>,
    /// Component (overrides the fetched component).
    #[arg(long)]
    pub component: Option<String>,
    /// Team (overrides the fetched team).
    #[arg(long)]
    pub team: Option<String>,
    /// Assignee (overrides the fetched assignee).
    #[arg(long)]
    pub assignee: Option<String>,
    /// Project key (overrides the fetched project key).
    #[arg(long)]
    pub project_key: Option<String>,
    /// Maximum number of queue issues to triage.
    #[arg(long, default_value_t = 100)]
    pub max_issues: usize,
}

impl TriageArgs {
    fn overrides(&self) -> TicketOverrides {
        TicketOverrides {
            title: self.title.clone(),
            description: self.description.clone(),
            component: self.component.clone(),
            team: self.team.clone(),
            assignee: self.assignee.clone(),
            project_key: self.project_key.clone(),
        }
    }
}

pub async fn run(ctx: &AppContext, args: TriageArgs) -> AppResult<()> {
    let overrides = args.overrides();
    match &args.key {
        Some(key) => {
            let outcome = triage_single(ctx, key, &overrides).await?;
            print_panel(&outcome);
        }
        None if has_override(&overrides) => {
            let outcome = triage_manual(ctx, &overrides).await?;
            print_panel(&outcome);
        }
        None => {
            let outcomes = triage_queue(ctx, args.max_issues).await?;
            print_table(&outcomes);
        }
    }
    Ok(())
}

fn has_override(overrides: &TicketOverrides) -> bool {
    overrides.title.is_some()
        || overrides.description.is_some()
        || overrides.component.is_some()
        || overrides.team.is_some()
        || overrides.assignee.is_some()
        || overrides.project_key.is_some()
}

fn print_panel(outcome: &TriageOutcome) {
    if !outcome.prediction.has_recommendation() {
        println!("No prediction available.");
        return;
    }
    println!("Recommended Assignment");
    if !outcome.prediction.team.is_empty() {
        println!("  Team:       {}", outcome.prediction.team);
    }
    if !outcome.prediction.component.is_empty() {
        println!("  Component:  {}", outcome.prediction.component);
    }
    println!("  Confidence: {:.2}", outcome.prediction.confidence);
}

fn print_table(outcomes: &[TriageOutcome]) {
    let rows: Vec<_> = outcomes.iter().map(queue_row).collect();
    let key_width = rows
        .iter()
        .map(|row| row.key.len())
        .chain(["Issue Key".len()])
        .max()
        .unwrap_or(0);
    let team_width = rows
        .iter()
        .map(|row| row.team.len())
        .chain(["Team Assignment".len()])
        .max()
        .unwrap_or(0);
    let component_width = rows
        .iter()
        .map(|row| row.component.len())
        .chain(["Component Assignment".len()])
        .max()
        .unwrap_or(0);

    println!();
    println!(
        "{:<key_width$}  {:<team_width$}  {:<component_width$}  Confidence",
        "Issue Key", "Team Assignment", "Component Assignment"
    );
    for row in &rows {
        println!(
            "{:<key_width$}  {:<team_width$}  {:<component_width$}  {}",
            row.key, row.team, row.component, row.confidence
        );
    }
}
