use std::io::{self, BufRead, Write};

use clap::{Args, Subcommand};
use serde_json::{Map, Value};

use crate::config::{StoredConfig, config_file_path};
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Interactively set tracker and agent credentials.
    Init,
    /// Print the stored configuration, secrets masked.
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => init(),
        ConfigCommand::Show => show(),
    }
}

/// One editable slot of the stored configuration.
struct FieldSpec {
    label: &'static str,
    hint: &'static str,
    secret: bool,
    slot: fn(&mut StoredConfig) -> &mut Option<String>,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        label: "Jira base URL",
        hint: "https://issues.example.com",
        secret: false,
        slot: |cfg| &mut cfg.jira_base_url,
    },
    FieldSpec {
        label: "Jira email",
        hint: "",
        secret: false,
        slot: |cfg| &mut cfg.jira_email,
    },
    FieldSpec {
        label: "Jira API token",
        hint: "",
        secret: true,
        slot: |cfg| &mut cfg.jira_token,
    },
    FieldSpec {
        label: "Jira team custom field id",
        hint: "customfield_12313240",
        secret: false,
        slot: |cfg| &mut cfg.jira_team_field,
    },
    FieldSpec {
        label: "Default project keys, comma-separated",
        hint: "SUPP,CORE",
        secret: false,
        slot: |cfg| &mut cfg.default_projects,
    },
    FieldSpec {
        label: "Team name to id map, single-line JSON object",
        hint: r#"{"Core": 4366}"#,
        secret: false,
        slot: |cfg| &mut cfg.team_id_map,
    },
    FieldSpec {
        label: "Gemini API key",
        hint: "",
        secret: true,
        slot: |cfg| &mut cfg.gemini_api_key,
    },
    FieldSpec {
        label: "Gemini model",
        hint: "gemini-2.0-flash",
        secret: false,
        slot: |cfg| &mut cfg.gemini_model,
    },
];

fn init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring the triage CLI.");
    println!("Enter keeps the current value, '-' clears it.");
    println!("Secrets land in the local config file; protect your filesystem accordingly.");
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    for field in FIELDS {
        let slot = (field.slot)(&mut cfg);
        let mut stdout = io::stdout();
        write!(stdout, "{}{}{}: ", field.label, hint(field), current(slot.as_deref(), field.secret))?;
        stdout.flush()?;

        let line = lines.next().transpose()?.unwrap_or_default();
        match parse_edit(&line) {
            Edit::Keep => {}
            Edit::Clear => *slot = None,
            Edit::Set(value) => *slot = Some(value),
        }
    }

    if let Some(raw) = &cfg.team_id_map {
        if serde_json::from_str::<Map<String, Value>>(raw).is_err() {
            println!("Note: the team id map is not a JSON object; `review` will not resolve teams.");
        }
    }

    cfg.save()?;
    println!("\nSaved {}", config_file_path()?.display());
    Ok(())
}

fn show() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;
    println!("Configuration file: {}", config_file_path()?.display());

    for field in FIELDS {
        let rendered = match (field.slot)(&mut cfg).as_deref() {
            None | Some("") => "<not set>".to_string(),
            Some(value) if field.secret => mask(value),
            Some(value) => value.to_string(),
        };
        println!("{}: {rendered}", field.label);
    }
    Ok(())
}

enum Edit {
    Keep,
    Clear,
    Set(String),
}

fn parse_edit(input: &str) -> Edit {
    match input.trim() {
        "" => Edit::Keep,
        "-" => Edit::Clear,
        value => Edit::Set(value.to_string()),
    }
}

fn hint(field: &FieldSpec) -> String {
    if field.hint.is_empty() {
        String::new()
    } else {
        format!(" (e.g. {})", field.hint)
    }
}

fn current(value: Option<&str>, secret: bool) -> String {
    match value {
        None | Some("") => String::new(),
        Some(value) if secret => format!(" [{}]", mask(value)),
        Some(value) => format!(" [{value}]"),
    }
}

/// Keep only a short tail of a secret; short secrets are hidden entirely.
fn mask(secret: &str) -> String {
    if secret.len() <= 6 || !secret.is_char_boundary(secret.len() - 3) {
        return "***".to_string();
    }
    format!("***{}", &secret[secret.len() - 3..])
}
