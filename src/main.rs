mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::harvest::{self, HarvestArgs};
use crate::cmd::review::{self, ReviewArgs};
use crate::cmd::triage::{self, TriageArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::jira::JiraClient;
use crate::infra::llm::GeminiClient;

#[derive(Parser)]
#[command(name = "triage", author, version, about = "Issue-tracker triage CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest resolved tickets into the local knowledge corpus.
    Harvest(HarvestArgs),
    /// Recommend team/component for one ticket or the filtered queue.
    Triage(TriageArgs),
    /// Interactively review predictions and apply approved changes.
    Review(ReviewArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command),
        Commands::Harvest(args) => {
            let context = build_context()?;
            harvest::run(&context, args).await
        }
        Commands::Triage(args) => {
            let context = build_context()?;
            triage::run(&context, args).await
        }
        Commands::Review(args) => {
            let context = build_context()?;
            review::run(&context, args).await
        }
    }
}

fn build_context() -> AppResult<AppContext> {
    let config = AppConfig::load()?;

    if config.jira_base_url.is_none() {
        eprintln!("Warning: Jira base URL not configured; tracker calls will fail.");
    }
    if config.jira_email.is_none() {
        eprintln!("Warning: Jira email not configured; tracker calls will fail.");
    }
    if config.jira_token.is_none() {
        eprintln!("Warning: Jira token not configured; tracker calls will fail.");
    }
    if config.gemini_api_key.is_none() {
        eprintln!("Warning: Gemini API key not configured; predictions will fail.");
    }

    let issue_tracker = Arc::new(JiraClient::new(
        config.jira_base_url.clone(),
        config.jira_email.clone(),
        config.jira_token.clone(),
        config.jira_team_field.clone(),
    ));
    let triager = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    ));

    Ok(AppContext::new(config, issue_tracker, triager))
}
