use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::ticket::TicketRecord;
use crate::domain::triage::Prediction;
use crate::error::{AppError, AppResult};
use crate::services::TriageService;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Self {
        Self {
            http: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    fn api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Gemini API key not configured".to_string()))
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, api_key
        )
    }

    fn build_prompt(ticket: &TicketRecord, missing: &[&str]) -> String {
        let mut lines = vec![
            "You are an expert issue-tracker triager.".to_string(),
            "Recommend the best team and component for the ticket below, based on \
             historical assignment patterns."
                .to_string(),
            "Respond with ONLY a JSON object with keys \"team\", \"component\", and \
             \"confidence\" (a number between 0.0 and 1.0). No explanation, no markdown."
                .to_string(),
            "Do not include fields that are already assigned.".to_string(),
            String::new(),
        ];
        if !ticket.component.is_empty() {
            lines.push(format!("Current component: {}", ticket.component));
        }
        if !ticket.team.is_empty() {
            lines.push(format!("Current team: {}", ticket.team));
        }
        if !ticket.assignee.is_empty() {
            lines.push(format!("Current assignee: {}", ticket.assignee));
        }
        lines.push("Given the current ticket:".to_string());
        lines.push(format!("Title: {}", ticket.title));
        lines.push(format!("Description: {}", ticket.description));
        lines.push(format!(
            "The current ticket is missing the following field(s): {}.",
            missing.join(", ")
        ));
        lines.join("\n")
    }

    /// Pull the first JSON object out of a model reply, tolerating fenced
    /// code blocks and surrounding prose.
    fn extract_json(content: &str) -> &str {
        let trimmed = content.trim();
        let start = trimmed.find('{');
        let end = trimmed.rfind('}');
        match (start, end) {
            (Some(start), Some(end)) if start < end => &trimmed[start..=end],
            _ => trimmed,
        }
    }

    fn prediction_from_reply(reply: &str, missing: &[&str]) -> AppResult<Prediction> {
        let parsed: Value = serde_json::from_str(Self::extract_json(reply)).map_err(|err| {
            AppError::Triage(format!("failed to parse agent response: {err}"))
        })?;

        let field = |name: &str| {
            if missing.contains(&name) {
                parsed
                    .get(name)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            } else {
                String::new()
            }
        };
        let confidence = parsed
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        Ok(Prediction::new(field("team"), field("component"), confidence))
    }
}

#[async_trait]
impl TriageService for GeminiClient {
    async fn triage(&self, ticket: &TicketRecord) -> AppResult<Prediction> {
        let mut missing = Vec::new();
        if ticket.team.is_empty() {
            missing.push("team");
        }
        if ticket.component.is_empty() {
            missing.push("component");
        }
        // Nothing to recommend when both fields are already assigned.
        if missing.is_empty() {
            return Ok(Prediction::default());
        }

        let api_key = self.api_key()?;
        let body = json!({
            "contents": [{
                "parts": [{ "text": Self::build_prompt(ticket, &missing) }]
            }]
        });

        let response = self
            .http
            .post(self.endpoint(api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| AppError::Triage(format!("failed to call Gemini: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Triage(format!(
                "Gemini responded with {status}: {body}"
            )));
        }

        let payload: GeminiResponse = response.json().await.map_err(|err| {
            AppError::Triage(format!("failed to parse Gemini response: {err}"))
        })?;

        let reply = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| AppError::Triage("Gemini returned no candidates".to_string()))?;

        Self::prediction_from_reply(&reply, &missing)
    }
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_from_fenced_block() {
        let reply = "```json\n{\"team\": \"Core\", \"confidence\": 0.8}\n```";
        assert_eq!(
            GeminiClient::extract_json(reply),
            "{\"team\": \"Core\", \"confidence\": 0.8}"
        );
    }

    #[test]
    fn extracts_json_surrounded_by_prose() {
        let reply = "Here you go: {\"team\": \"Core\"} hope that helps";
        assert_eq!(GeminiClient::extract_json(reply), "{\"team\": \"Core\"}");
    }

    #[test]
    fn reply_fields_limited_to_missing_ones() {
        let reply = r#"{"team": "Core", "component": "UI", "confidence": 0.9}"#;
        let prediction = GeminiClient::prediction_from_reply(reply, &["component"]).unwrap();
        assert_eq!(prediction.team, "");
        assert_eq!(prediction.component, "UI");
        assert_eq!(prediction.confidence, 0.9);
    }

    #[test]
    fn malformed_reply_is_a_triage_error() {
        let err = GeminiClient::prediction_from_reply("no json here", &["team"]).unwrap_err();
        assert!(matches!(err, AppError::Triage(_)));
    }

    #[tokio::test]
    async fn fully_assigned_ticket_skips_the_agent() {
        let client = GeminiClient::new(None, None);
        let ticket = TicketRecord {
            key: "PROJ-3".to_string(),
            team: "Core".to_string(),
            component: "UI".to_string(),
            ..TicketRecord::default()
        };
        // No API key configured, so reaching the network would fail loudly.
        let prediction = client.triage(&ticket).await.unwrap();
        assert!(!prediction.has_recommendation());
        assert_eq!(prediction.confidence, 0.0);
    }

    #[test]
    fn prompt_names_missing_fields_and_context() {
        let ticket = TicketRecord {
            key: "PROJ-4".to_string(),
            title: "RBAC rules ignored".to_string(),
            description: "policy file not loaded".to_string(),
            component: "RBAC Plugin".to_string(),
            ..TicketRecord::default()
        };
        let prompt = GeminiClient::build_prompt(&ticket, &["team"]);
        assert!(prompt.contains("Current component: RBAC Plugin"));
        assert!(prompt.contains("Title: RBAC rules ignored"));
        assert!(prompt.contains("missing the following field(s): team."));
    }
}
