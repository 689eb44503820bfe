//! Alert payloads and outcome classification.
//!
//! The network call itself belongs to the transport collaborator. This module
//! owns what goes on the wire and how the result is reported back.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::density::VenueStatus;
use crate::error::MonitorError;
use crate::events::LogKind;

/// Timeframe reported when no episode start is known.
pub const FALLBACK_TIMEFRAME: &str = "3+ seconds";

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Used whenever geolocation is unavailable.
    pub const FALLBACK: Coordinates = Coordinates {
        lat: 40.7128,
        lon: -74.0060,
    };

    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lon)
    }
}

/// How long the venue has been critical, as sent to the alert endpoint.
pub fn format_timeframe(critical_elapsed: Option<Duration>) -> String {
    match critical_elapsed {
        Some(elapsed) => format!("{} seconds", elapsed.as_secs_f64().round() as u64),
        None => FALLBACK_TIMEFRAME.to_string(),
    }
}

/// JSON body posted to the alert endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub timeframe: String,
    pub status: String,
    pub location: String,
}

impl AlertRequest {
    pub fn new(timeframe: impl Into<String>, status: VenueStatus, location: Coordinates) -> Self {
        Self {
            timeframe: timeframe.into(),
            status: status.label().to_string(),
            location: location.to_string(),
        }
    }
}

/// Parsed response of the alert endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

/// Result of one alert attempt.
///
/// Every variant counts as "alert attempted": none of them causes a retry
/// within the same critical episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum AlertOutcome {
    /// The endpoint acknowledged with an explicit success flag.
    Posted { record_id: Option<String> },
    /// The endpoint answered without a success flag.
    PostFailed { message: String },
    /// The transport raised an error.
    TransportError { detail: String },
}

impl AlertOutcome {
    /// Classify a transport result.
    pub fn from_result(result: Result<TransportReply, MonitorError>) -> Self {
        match result {
            Ok(reply) if reply.success => Self::Posted {
                record_id: reply.record_id,
            },
            Ok(reply) => Self::PostFailed {
                message: reply
                    .message
                    .unwrap_or_else(|| "endpoint reported failure".to_string()),
            },
            Err(e) => Self::TransportError {
                detail: e.to_string(),
            },
        }
    }

    pub fn is_posted(&self) -> bool {
        matches!(self, Self::Posted { .. })
    }

    /// Operator log entry for this outcome.
    pub fn log_entry(&self) -> (LogKind, String) {
        match self {
            Self::Posted { .. } => (LogKind::Info, "Alert posted successfully".to_string()),
            Self::PostFailed { .. } => (
                LogKind::Warning,
                "Failed to post alert; no automatic retry".to_string(),
            ),
            Self::TransportError { detail } => {
                (LogKind::Alert, format!("Error posting alert: {}", detail))
            }
        }
    }
}

/// Locally rendered notification, surfaced to the operator for every attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub message: String,
    pub location: String,
    pub status: String,
    pub timeframe: String,
    pub timestamp: DateTime<Utc>,
    pub delivered: bool,
}

impl NotificationRecord {
    pub fn new(message: &str, request: &AlertRequest, outcome: &AlertOutcome) -> Self {
        Self {
            message: message.to_string(),
            location: request.location.clone(),
            status: request.status.clone(),
            timeframe: request.timeframe.clone(),
            timestamp: Utc::now(),
            delivered: outcome.is_posted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_rounds_to_seconds() {
        assert_eq!(
            format_timeframe(Some(Duration::from_millis(4_400))),
            "4 seconds"
        );
        assert_eq!(
            format_timeframe(Some(Duration::from_millis(4_600))),
            "5 seconds"
        );
        assert_eq!(format_timeframe(None), "3+ seconds");
    }

    #[test]
    fn test_location_format() {
        assert_eq!(Coordinates::FALLBACK.to_string(), "40.7128,-74.0060");
        assert_eq!(Coordinates::new(51.5, -0.12346).to_string(), "51.5000,-0.1235");
    }

    #[test]
    fn test_request_uses_wire_labels() {
        let req = AlertRequest::new("4 seconds", VenueStatus::CriticalRisk, Coordinates::FALLBACK);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["status"], "CRITICAL RISK");
        assert_eq!(json["timeframe"], "4 seconds");
        assert_eq!(json["location"], "40.7128,-74.0060");
    }

    #[test]
    fn test_outcome_classification() {
        let posted = AlertOutcome::from_result(Ok(TransportReply {
            success: true,
            message: None,
            record_id: Some("abc".into()),
        }));
        assert!(posted.is_posted());
        assert_eq!(posted.log_entry().0, LogKind::Info);

        let failed = AlertOutcome::from_result(Ok(TransportReply::default()));
        assert!(!failed.is_posted());
        assert_eq!(failed.log_entry().0, LogKind::Warning);

        let errored = AlertOutcome::from_result(Err(MonitorError::TransportFailure(
            "connection refused".into(),
        )));
        let (kind, message) = errored.log_entry();
        assert_eq!(kind, LogKind::Alert);
        assert!(message.contains("connection refused"));
    }

    #[test]
    fn test_reply_tolerates_missing_fields() {
        let reply: TransportReply = serde_json::from_str("{}").unwrap();
        assert!(!reply.success);
        let reply: TransportReply =
            serde_json::from_str(r#"{"success": true, "record_id": "x1", "extra": 5}"#).unwrap();
        assert!(reply.success);
        assert_eq!(reply.record_id.as_deref(), Some("x1"));
    }

    #[test]
    fn test_record_reflects_delivery() {
        let req = AlertRequest::new("3+ seconds", VenueStatus::CriticalDensityCell, Coordinates::FALLBACK);
        let outcome = AlertOutcome::PostFailed {
            message: "500".into(),
        };
        let record = NotificationRecord::new("help", &req, &outcome);
        assert!(!record.delivered);
        assert_eq!(record.status, "Critical Density Cell Detected");
    }
}
