use std::io::{self, BufRead, Write};

use clap::Args;
use tracing::warn;

use crate::context::AppContext;
use crate::domain::ticket::TicketRecord;
use crate::domain::triage::Prediction;
use crate::error::AppResult;
use crate::workflow::apply::apply_changes;
use crate::workflow::review::{
    ReviewChoice, ReviewItem, ReviewSession, ReviewStep, summary_lines,
};
use crate::workflow::triage::triage_queue;

#[derive(Args, Debug, Clone)]
pub struct ReviewArgs {
    /// Maximum number of issues to review.
    #[arg(long, default_value_t = 20)]
    pub max_issues: usize,
}

pub async fn run(ctx: &AppContext, args: ReviewArgs) -> AppResult<()> {
    let outcomes = triage_queue(ctx, args.max_issues).await?;
    println!("Processing {} issues...\n", outcomes.len());

    let queue: Vec<ReviewItem> = outcomes
        .into_iter()
        .map(|outcome| ReviewItem {
            ticket: outcome.ticket,
            prediction: outcome.prediction,
        })
        .collect();

    let mut session = ReviewSession::new(queue);
    while let Some(item) = session.current() {
        let ticket = item.ticket.clone();
        let prediction = item.prediction.clone();
        print_item(&ticket, &prediction);

        loop {
            let input = prompt_choice()?;
            match session.apply_choice(ReviewChoice::parse(&input)) {
                ReviewStep::Approved => {
                    println!("Approved. Moving to next issue...");
                    break;
                }
                ReviewStep::Skipped => {
                    println!("Skipped. Moving to next issue...");
                    break;
                }
                ReviewStep::ShowDescription => print_description(&ticket),
                ReviewStep::OpenLink => {
                    open_ticket_link(ctx.config.jira_base_url.as_deref(), &ticket.key)
                }
                ReviewStep::Quit => {
                    println!("Quitting interactive review.");
                    break;
                }
                ReviewStep::Unrecognized => {
                    println!("Unrecognized choice. Please enter Y, S, D, O, or Q.");
                }
            }
        }
    }

    if session.approved_count() == 0 {
        println!("\nNo changes approved. Exiting.");
        return Ok(());
    }
    let approved = session.into_approved();

    println!("\n{}", "-".repeat(36));
    println!(
        "Finished review. Ready to apply {} changes to Jira:\n",
        approved.len()
    );
    for line in summary_lines(&approved) {
        println!("{line}");
    }

    if !confirm("\nProceed with applying these updates to Jira?")? {
        println!("Aborted. No changes applied.");
        return Ok(());
    }

    println!("\nApplying changes...");
    let results = apply_changes(
        ctx.issue_tracker.as_ref(),
        ctx.config.team_id_map.as_deref(),
        &approved,
    )
    .await;

    let total = results.len();
    let mut failed = 0;
    for (idx, (change, result)) in approved.iter().zip(&results).enumerate() {
        if result.updated {
            println!("[{}/{total}] Updated {}: {}", idx + 1, change.key, result.message);
        } else {
            failed += 1;
            println!(
                "[{}/{total}] Failed to update {}: {}",
                idx + 1,
                change.key,
                result.message
            );
        }
    }
    println!("\n{} succeeded, {failed} failed.", total - failed);
    println!("Triage complete!");
    Ok(())
}

fn print_item(ticket: &TicketRecord, prediction: &Prediction) {
    println!("{}", "-".repeat(36));
    println!("{}: {}", ticket.key, ticket.title);

    if !ticket.team.is_empty() || !ticket.component.is_empty() {
        println!("\nExisting assignment:");
        if !ticket.team.is_empty() {
            println!("  -> Team:      {}", ticket.team);
        }
        if !ticket.component.is_empty() {
            println!("  -> Component: {}", ticket.component);
        }
    }

    if prediction.has_recommendation() {
        println!("\nPrediction:");
        if !prediction.team.is_empty() {
            println!("  -> Team:      {}", prediction.team);
        }
        if !prediction.component.is_empty() {
            println!("  -> Component: {}", prediction.component);
        }
        println!("\nConfidence: {:.2}\n", prediction.confidence);
    } else if ticket.team.is_empty() && ticket.component.is_empty() {
        println!("\nNo prediction available.\n");
    }
}

fn print_description(ticket: &TicketRecord) {
    if ticket.description.is_empty() {
        println!("\nNo description available.");
    } else {
        println!("\nDescription:");
        println!("{}", ticket.description);
    }
}

fn open_ticket_link(base_url: Option<&str>, key: &str) {
    let Some(base_url) = base_url else {
        println!("Jira base URL not configured. Cannot open link.");
        return;
    };
    let url = format!("{}/browse/{}", base_url.trim_end_matches('/'), key);
    println!("{url}");
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    if let Err(err) = tokio::process::Command::new(opener).arg(&url).spawn() {
        warn!(error = %err, "could not open browser");
    }
}

fn prompt_choice() -> AppResult<String> {
    let mut stdout = io::stdout();
    write!(
        stdout,
        "(Y) Apply, (S) Skip, (D) Description, (O) Open link, (Q) Quit [Y]: "
    )?;
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input)
}

fn confirm(question: &str) -> AppResult<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "{question} [Y/n]: ")?;
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    let answer = input.trim().to_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}
