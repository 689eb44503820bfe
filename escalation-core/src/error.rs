//! Monitor error taxonomy.
//!
//! Every failure a collaborator can produce is represented here. None of the
//! collaborator failures are fatal to the monitoring loop: callers absorb them,
//! substitute a fallback, and surface them through the event log.
//!
//! | Variant               | Fatal | Substitution                         |
//! |-----------------------|-------|--------------------------------------|
//! | TransportFailure      | no    | record kept, no retry within episode |
//! | PlannerFailure        | no    | canned fallback plan                 |
//! | LocationUnavailable   | no    | fallback coordinate                  |
//! | InvalidGrid           | no    | sample dropped                       |
//! | MonitorStopped        | no    | command ignored                      |

use thiserror::Error;

/// Unified error type for the monitor and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// The notification post did not succeed (network error or non-success body).
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// Plan generation failed or produced no text.
    #[error("Planner failure: {0}")]
    PlannerFailure(String),

    /// Geolocation was missing or timed out.
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// A sampler produced a matrix of the wrong shape.
    #[error("Invalid grid: expected {expected_rows}x{expected_cols}, got {detail}")]
    InvalidGrid {
        expected_rows: usize,
        expected_cols: usize,
        detail: String,
    },

    /// The monitor actor is no longer accepting commands.
    #[error("Monitor stopped")]
    MonitorStopped,
}

impl MonitorError {
    /// Whether this error should take down the monitoring loop.
    ///
    /// Always `false`: availability of the escalation state machine is kept
    /// even when every collaborator is unreachable.
    pub fn is_fatal(&self) -> bool {
        false
    }

    /// Stable identifier for structured logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TransportFailure(_) => "transport_failure",
            Self::PlannerFailure(_) => "planner_failure",
            Self::LocationUnavailable(_) => "location_unavailable",
            Self::InvalidGrid { .. } => "invalid_grid",
            Self::MonitorStopped => "monitor_stopped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_variant_is_fatal() {
        let errors = [
            MonitorError::TransportFailure("503".into()),
            MonitorError::PlannerFailure("timeout".into()),
            MonitorError::LocationUnavailable("no fix".into()),
            MonitorError::InvalidGrid {
                expected_rows: 8,
                expected_cols: 8,
                detail: "7 rows".into(),
            },
            MonitorError::MonitorStopped,
        ];
        for err in &errors {
            assert!(!err.is_fatal(), "{} must not be fatal", err.kind());
        }
    }

    #[test]
    fn test_display_includes_detail() {
        let err = MonitorError::TransportFailure("connection refused".into());
        assert_eq!(err.to_string(), "Transport failure: connection refused");
        assert_eq!(err.kind(), "transport_failure");
    }
}
