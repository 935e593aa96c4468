use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::domain::ticket::{TicketRecord, normalize_description, team_field_name};
use crate::error::{AppError, AppResult};
use crate::services::{IssueTrackerService, SearchPage};

pub struct JiraClient {
    http: Client,
    base_url: Option<String>,
    email: Option<String>,
    token: Option<String>,
    team_field: String,
}

impl JiraClient {
    pub fn new(
        base_url: Option<String>,
        email: Option<String>,
        token: Option<String>,
        team_field: String,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url,
            email,
            token,
            team_field,
        }
    }

    fn api_details(&self) -> AppResult<(&str, &str, &str)> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira base URL not configured".to_string()))?;
        let email = self
            .email
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira email not configured".to_string()))?;
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Jira API token not configured".to_string()))?;
        Ok((base_url, email, token))
    }

    fn auth_header(email: &str, token: &str) -> String {
        let credentials = format!("{email}:{token}");
        let encoded = BASE64_STANDARD.encode(credentials);
        format!("Basic {encoded}")
    }

    fn search_endpoint(base_url: &str) -> String {
        format!("{}/rest/api/2/search", base_url.trim_end_matches('/'))
    }

    fn issue_endpoint(base_url: &str, key: &str) -> String {
        format!("{}/rest/api/2/issue/{}", base_url.trim_end_matches('/'), key)
    }

    fn request_fields(&self) -> String {
        format!(
            "summary,description,components,assignee,project,{}",
            self.team_field
        )
    }

    async fn update_fields(&self, key: &str, fields: Value) -> AppResult<()> {
        let (base_url, email, token) = self.api_details()?;
        let response = self
            .http
            .put(Self::issue_endpoint(base_url, key))
            .header(AUTHORIZATION, Self::auth_header(email, token))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|err| AppError::IssueTracker(format!("failed to call Jira: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::IssueTracker(format!(
                "Jira responded with {status}: {body}"
            )));
        }
        Ok(())
    }

    fn ticket_record(&self, issue: JiraIssue) -> TicketRecord {
        let fields = issue.fields;
        let component = fields
            .components
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|component| component.name)
            .unwrap_or_default();
        let team = team_field_name(fields.extra.get(&self.team_field));
        TicketRecord {
            key: issue.key,
            title: fields.summary.unwrap_or_default(),
            description: normalize_description(&fields.description.unwrap_or_default()),
            component,
            team,
            assignee: fields
                .assignee
                .map(|assignee| assignee.display_name)
                .unwrap_or_default(),
            project_key: fields.project.map(|project| project.key).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl IssueTrackerService for JiraClient {
    async fn search(
        &self,
        jql: &str,
        start_at: usize,
        max_results: usize,
    ) -> AppResult<SearchPage> {
        let (base_url, email, token) = self.api_details()?;
        let response = self
            .http
            .get(Self::search_endpoint(base_url))
            .header(AUTHORIZATION, Self::auth_header(email, token))
            .header(ACCEPT, "application/json")
            .query(&[
                ("jql", jql.to_string()),
                ("startAt", start_at.to_string()),
                ("maxResults", max_results.to_string()),
                ("fields", self.request_fields()),
            ])
            .send()
            .await
            .map_err(|err| AppError::IssueTracker(format!("failed to call Jira: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::IssueTracker(format!(
                "Jira responded with {status}: {body}"
            )));
        }

        let payload: JiraSearchResponse = response.json().await.map_err(|err| {
            AppError::IssueTracker(format!("failed to parse Jira search response: {err}"))
        })?;

        Ok(SearchPage {
            total: payload.total,
            tickets: payload
                .issues
                .into_iter()
                .map(|issue| self.ticket_record(issue))
                .collect(),
        })
    }

    async fn fetch_ticket(&self, key: &str) -> AppResult<TicketRecord> {
        let (base_url, email, token) = self.api_details()?;
        let response = self
            .http
            .get(Self::issue_endpoint(base_url, key))
            .header(AUTHORIZATION, Self::auth_header(email, token))
            .header(ACCEPT, "application/json")
            .query(&[("fields", self.request_fields())])
            .send()
            .await
            .map_err(|err| {
                AppError::IssueTracker(format!("could not fetch issue {key}: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::IssueTracker(format!(
                "could not fetch issue {key}: Jira responded with {status}: {body}"
            )));
        }

        let issue: JiraIssue = response.json().await.map_err(|err| {
            AppError::IssueTracker(format!("failed to parse Jira issue response: {err}"))
        })?;

        Ok(self.ticket_record(issue))
    }

    async fn set_team(&self, key: &str, team_id: &Value) -> AppResult<()> {
        let mut fields = Map::new();
        fields.insert(self.team_field.clone(), team_id.clone());
        self.update_fields(key, Value::Object(fields)).await
    }

    async fn set_components(&self, key: &str, components: &[String]) -> AppResult<()> {
        let payload: Vec<Value> = components
            .iter()
            .map(|name| json!({ "name": name }))
            .collect();
        self.update_fields(key, json!({ "components": payload })).await
    }
}

#[derive(Deserialize)]
struct JiraSearchResponse {
    total: usize,
    issues: Vec<JiraIssue>,
}

#[derive(Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraIssueFields,
}

#[derive(Deserialize)]
struct JiraIssueFields {
    summary: Option<String>,
    description: Option<String>,
    components: Option<Vec<JiraComponent>>,
    assignee: Option<JiraUser>,
    project: Option<JiraProjectRef>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct JiraComponent {
    name: String,
}

#[derive(Deserialize)]
struct JiraUser {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Deserialize)]
struct JiraProjectRef {
    key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> JiraClient {
        JiraClient::new(
            Some("https://tracker.example.com/".to_string()),
            Some("dev@example.com".to_string()),
            Some("token".to_string()),
            "customfield_12313240".to_string(),
        )
    }

    #[test]
    fn endpoints_trim_trailing_slash() {
        assert_eq!(
            JiraClient::search_endpoint("https://tracker.example.com/"),
            "https://tracker.example.com/rest/api/2/search"
        );
        assert_eq!(
            JiraClient::issue_endpoint("https://tracker.example.com", "PROJ-7"),
            "https://tracker.example.com/rest/api/2/issue/PROJ-7"
        );
    }

    #[test]
    fn maps_issue_with_object_team_field() {
        let issue: JiraIssue = serde_json::from_value(serde_json::json!({
            "key": "PROJ-1",
            "fields": {
                "summary": "Login fails",
                "description": "steps{noformat}trace{noformat}\r\nend",
                "components": [{"name": "Authentication"}, {"name": "UI"}],
                "assignee": {"displayName": "Sam Doe"},
                "project": {"key": "PROJ"},
                "customfield_12313240": {"name": "Core", "id": 11}
            }
        }))
        .unwrap();

        let ticket = client().ticket_record(issue);
        assert_eq!(ticket.key, "PROJ-1");
        assert_eq!(ticket.title, "Login fails");
        assert_eq!(ticket.description, "stepstrace\nend");
        assert_eq!(ticket.component, "Authentication");
        assert_eq!(ticket.team, "Core");
        assert_eq!(ticket.assignee, "Sam Doe");
        assert_eq!(ticket.project_key, "PROJ");
    }

    #[test]
    fn maps_issue_with_missing_fields_to_empty_strings() {
        let issue: JiraIssue = serde_json::from_value(serde_json::json!({
            "key": "PROJ-2",
            "fields": {
                "summary": null,
                "customfield_12313240": "Install"
            }
        }))
        .unwrap();

        let ticket = client().ticket_record(issue);
        assert_eq!(ticket.title, "");
        assert_eq!(ticket.description, "");
        assert_eq!(ticket.component, "");
        assert_eq!(ticket.team, "Install");
        assert_eq!(ticket.assignee, "");
        assert_eq!(ticket.project_key, "");
    }

    #[test]
    fn missing_credentials_surface_as_configuration_errors() {
        let client = JiraClient::new(None, None, None, "customfield_12313240".to_string());
        let err = client.api_details().unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
