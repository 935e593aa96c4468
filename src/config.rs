use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_TEAM_FIELD: &str = "customfield_12313240";

/// Values persisted by `triage config init`. Everything is optional; the
/// effective configuration is assembled by `AppConfig::load`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    pub jira_base_url: Option<String>,
    pub jira_email: Option<String>,
    pub jira_token: Option<String>,
    pub jira_team_field: Option<String>,
    pub default_projects: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub team_id_map: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        let path = config_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid config file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(&path, data)?;
        Ok(())
    }
}

/// Effective runtime configuration: stored values with environment overrides
/// applied. Components receive these values at construction time and never
/// read the environment themselves.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jira_base_url: Option<String>,
    pub jira_email: Option<String>,
    pub jira_token: Option<String>,
    pub jira_team_field: String,
    pub projects: Vec<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub team_id_map: Option<String>,
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;

        let projects_raw = env_override("TRIAGE_PROJECTS")
            .or(stored.default_projects)
            .unwrap_or_default();

        Ok(Self {
            jira_base_url: env_override("JIRA_URL").or(stored.jira_base_url),
            jira_email: env_override("JIRA_EMAIL").or(stored.jira_email),
            jira_token: env_override("JIRA_PERSONAL_TOKEN").or(stored.jira_token),
            jira_team_field: env_override("JIRA_TEAM_FIELD")
                .or(stored.jira_team_field)
                .unwrap_or_else(|| DEFAULT_TEAM_FIELD.to_string()),
            projects: parse_projects(&projects_raw),
            gemini_api_key: env_override("GEMINI_API_KEY").or(stored.gemini_api_key),
            gemini_model: env_override("GEMINI_MODEL").or(stored.gemini_model),
            team_id_map: env_override("TEAM_ID_MAP").or(stored.team_id_map),
        })
    }
}

pub fn parse_projects(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_override(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub fn config_directory() -> AppResult<PathBuf> {
    if let Some(dir) = env::var_os("TRIAGE_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(dir).join("triage"));
    }
    let home = env::var_os("HOME").ok_or_else(|| {
        AppError::Configuration("cannot locate config directory: HOME is not set".to_string())
    })?;
    Ok(PathBuf::from(home).join(".config").join("triage"))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_project_keys() {
        assert_eq!(
            parse_projects("SUPP, CORE ,BUGS"),
            vec!["SUPP", "CORE", "BUGS"]
        );
    }

    #[test]
    fn skips_empty_project_entries() {
        assert_eq!(parse_projects("SUPP,,  ,CORE"), vec!["SUPP", "CORE"]);
        assert!(parse_projects("").is_empty());
    }
}
