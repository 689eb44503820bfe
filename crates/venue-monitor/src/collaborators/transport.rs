//! HTTP notification transport.
//!
//! Posts `{ timeframe, status, location }` as JSON. Success requires both a
//! 2xx status and `"success": true` in the body.

use anyhow::{Context, Result};
use async_trait::async_trait;
use escalation_core::{AlertRequest, MonitorError, TransportReply};
use tracing::{debug, warn};

use super::NotificationTransport;
use crate::config::AlertEndpoint;

pub struct HttpAlertTransport {
    url: String,
    client: reqwest::Client,
}

impl HttpAlertTransport {
    pub fn from_config(endpoint: &AlertEndpoint) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(endpoint.timeout)
            .build()
            .context("Failed to build alert HTTP client")?;
        Ok(Self {
            url: endpoint.url.clone(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationTransport for HttpAlertTransport {
    async fn post(&self, request: &AlertRequest) -> Result<TransportReply, MonitorError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| MonitorError::TransportFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Alert endpoint returned error status");
            return Ok(TransportReply {
                success: false,
                message: Some(format!("HTTP {}", status)),
                record_id: None,
            });
        }

        match response.json::<TransportReply>().await {
            Ok(reply) => {
                debug!(success = reply.success, "Alert endpoint replied");
                Ok(reply)
            }
            Err(e) => Ok(TransportReply {
                success: false,
                message: Some(format!("unreadable reply: {}", e)),
                record_id: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escalation_core::{AlertOutcome, Coordinates, VenueStatus};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> AlertRequest {
        AlertRequest::new("4 seconds", VenueStatus::CriticalRisk, Coordinates::FALLBACK)
    }

    /// Endpoint answering every alert POST with `reply`, exactly once.
    async fn endpoint_replying(reply: ResponseTemplate) -> (MockServer, HttpAlertTransport) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/send-alert"))
            .respond_with(reply)
            .expect(1)
            .mount(&server)
            .await;
        let transport = HttpAlertTransport::from_config(&AlertEndpoint {
            url: format!("{}/api/send-alert", server.uri()),
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        (server, transport)
    }

    #[tokio::test]
    async fn test_success_reply_is_posted() {
        let (server, transport) = endpoint_replying(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "record_id": "r-7" })),
        )
        .await;

        let reply = transport.post(&request()).await.unwrap();
        assert_eq!(
            AlertOutcome::from_result(Ok(reply)),
            AlertOutcome::Posted {
                record_id: Some("r-7".into())
            }
        );

        let sent = &server.received_requests().await.unwrap()[0];
        let body = sent.body_json::<serde_json::Value>().unwrap();
        assert_eq!(body["status"], "CRITICAL RISK");
        assert_eq!(body["timeframe"], "4 seconds");
        assert_eq!(body["location"], "40.7128,-74.0060");
    }

    #[tokio::test]
    async fn test_success_false_is_post_failed() {
        let (_server, transport) = endpoint_replying(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "message": "queue full" })),
        )
        .await;

        let reply = transport.post(&request()).await.unwrap();
        assert!(!reply.success);
        assert_eq!(
            AlertOutcome::from_result(Ok(reply)),
            AlertOutcome::PostFailed {
                message: "queue full".into()
            }
        );
    }

    #[tokio::test]
    async fn test_error_status_is_post_failed_even_with_success_body() {
        let (_server, transport) = endpoint_replying(
            ResponseTemplate::new(500).set_body_json(json!({ "success": true })),
        )
        .await;

        let reply = transport.post(&request()).await.unwrap();
        assert!(!reply.success);
        assert_eq!(
            reply.message.as_deref(),
            Some("HTTP 500 Internal Server Error")
        );
        assert!(matches!(
            AlertOutcome::from_result(Ok(reply)),
            AlertOutcome::PostFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_unreadable_body_is_post_failed() {
        let (_server, transport) =
            endpoint_replying(ResponseTemplate::new(200).set_body_string("<html>ok</html>")).await;

        let reply = transport.post(&request()).await.unwrap();
        assert!(!reply.success);
        assert!(reply
            .message
            .as_deref()
            .unwrap()
            .starts_with("unreadable reply:"));
        assert!(matches!(
            AlertOutcome::from_result(Ok(reply)),
            AlertOutcome::PostFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_failure() {
        // Port 9 (discard) on loopback is expected to refuse connections.
        let transport = HttpAlertTransport::from_config(&AlertEndpoint {
            url: "http://127.0.0.1:9/api/send-alert".into(),
            timeout: Duration::from_millis(500),
        })
        .unwrap();
        let err = transport.post(&request()).await.unwrap_err();
        assert_eq!(err.kind(), "transport_failure");
    }
}
