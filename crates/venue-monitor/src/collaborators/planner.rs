//! Gemini-backed response planner.

use anyhow::{Context, Result};
use async_trait::async_trait;
use escalation_core::plan::{EMPTY_RESPONSE, SIMULATION_PLAN};
use escalation_core::MonitorError;
use tracing::{debug, warn};

use super::Planner;
use crate::config::PlannerEndpoint;

/// Plans via the Gemini `generateContent` REST endpoint.
///
/// Without an API key the planner runs in simulation mode and returns a
/// canned plan instead of calling out.
pub struct GeminiPlanner {
    endpoint: PlannerEndpoint,
    client: reqwest::Client,
}

impl GeminiPlanner {
    pub fn from_config(endpoint: &PlannerEndpoint) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(endpoint.timeout)
            .build()
            .context("Failed to build planner HTTP client")?;
        Ok(Self {
            endpoint: endpoint.clone(),
            client,
        })
    }

    pub fn is_simulation(&self) -> bool {
        self.endpoint.api_key.is_none()
    }
}

/// Prompt for a concise bulleted response plan.
pub fn build_prompt(density_signal: u32) -> String {
    format!(
        "Context: A stampede management system has detected a high crowd density of {}% in a public sector.\n\
         Role: You are an emergency response coordinator AI.\n\
         Task: Generate a very concise, bulleted emergency action plan.\n\
         Format:\n\
         - **Police Action**: [2-3 immediate crowd control tactics]\n\
         - **Medical Response**: [2 immediate triage instructions]\n\
         - **Public Announcement**: [1 sentence to broadcast]\n\
         Keep it strictly professional, urgent, and under 100 words.",
        density_signal
    )
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: &serde_json::Value) -> String {
    body["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[async_trait]
impl Planner for GeminiPlanner {
    async fn generate_plan(&self, density_signal: u32) -> Result<String, MonitorError> {
        let Some(api_key) = self.endpoint.api_key.as_deref() else {
            debug!("Planner API key missing; returning simulation plan");
            return Ok(SIMULATION_PLAN.to_string());
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.endpoint.base_url.trim_end_matches('/'),
            self.endpoint.model
        );
        let request_body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": build_prompt(density_signal) }]
            }]
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request_body)
            .send()
            .await
            .map_err(|e| MonitorError::PlannerFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Planner request rejected");
            return Err(MonitorError::PlannerFailure(format!("HTTP {}", status)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MonitorError::PlannerFailure(format!("invalid response body: {}", e)))?;

        let text = extract_text(&body);
        if text.trim().is_empty() {
            warn!("Planner returned no text");
            return Err(MonitorError::PlannerFailure(EMPTY_RESPONSE.into()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint(api_key: Option<&str>) -> PlannerEndpoint {
        PlannerEndpoint {
            base_url: "http://127.0.0.1:9".into(),
            api_key: api_key.map(String::from),
            model: "test-model".into(),
            timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_simulation_mode_without_key() {
        let planner = GeminiPlanner::from_config(&endpoint(None)).unwrap();
        assert!(planner.is_simulation());
        assert_eq!(planner.generate_plan(300).await.unwrap(), SIMULATION_PLAN);
    }

    /// Planner keyed against a mock answering `generateContent` with `reply`.
    async fn planner_replying(reply: ResponseTemplate) -> (MockServer, GeminiPlanner) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/test-model:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(reply)
            .expect(1)
            .mount(&server)
            .await;
        let planner = GeminiPlanner::from_config(&PlannerEndpoint {
            base_url: server.uri(),
            ..endpoint(Some("test-key"))
        })
        .unwrap();
        (server, planner)
    }

    #[tokio::test]
    async fn test_generated_text_is_returned() {
        let (server, planner) = planner_replying(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "- **Police Action**: hold gates" }] }
            }]
        })))
        .await;

        assert!(!planner.is_simulation());
        let plan = planner.generate_plan(320).await.unwrap();
        assert_eq!(plan, "- **Police Action**: hold gates");

        let sent = &server.received_requests().await.unwrap()[0];
        let body = sent.body_json::<serde_json::Value>().unwrap();
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("320%"));
    }

    #[tokio::test]
    async fn test_error_status_is_planner_failure() {
        let (_server, planner) =
            planner_replying(ResponseTemplate::new(500).set_body_string("quota exceeded")).await;

        let err = planner.generate_plan(300).await.unwrap_err();
        assert_eq!(err.kind(), "planner_failure");
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_planner_failure() {
        let (_server, planner) =
            planner_replying(ResponseTemplate::new(200).set_body_string("not json")).await;

        let err = planner.generate_plan(300).await.unwrap_err();
        assert_eq!(err.kind(), "planner_failure");
        assert!(err.to_string().contains("invalid response body"));
    }

    #[tokio::test]
    async fn test_empty_text_is_planner_failure() {
        let (_server, planner) = planner_replying(
            ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })),
        )
        .await;

        let err = planner.generate_plan(300).await.unwrap_err();
        assert!(matches!(
            err,
            MonitorError::PlannerFailure(ref detail) if detail == EMPTY_RESPONSE
        ));
    }

    #[test]
    fn test_prompt_mentions_signal_and_sections() {
        let prompt = build_prompt(450);
        assert!(prompt.contains("450%"));
        assert!(prompt.contains("Police Action"));
        assert!(prompt.contains("Medical Response"));
        assert!(prompt.contains("Public Announcement"));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "- Police: a\n" }, { "text": "- Medical: b" }] }
            }]
        });
        assert_eq!(extract_text(&body), "- Police: a\n- Medical: b");
    }

    #[test]
    fn test_extract_text_tolerates_missing_candidates() {
        assert_eq!(extract_text(&serde_json::json!({})), "");
        assert_eq!(
            extract_text(&serde_json::json!({ "candidates": [] })),
            ""
        );
    }
}
