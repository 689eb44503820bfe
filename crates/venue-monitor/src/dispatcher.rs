//! Alert dispatcher: resolves the location, posts the alert and classifies
//! the outcome.
//!
//! The dispatcher never fails. Transport errors, non-success replies and even
//! a panicking transport all come back as an [`AlertOutcome`], so nothing
//! raised here can reach the monitor loop.

use std::sync::Arc;
use std::time::Duration;

use escalation_core::{
    AlertOutcome, AlertRequest, Coordinates, DispatchReason, MonitorError, NotificationRecord,
    VenueStatus,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collaborators::{locate, Geolocator, NotificationTransport};

/// An accepted dispatch waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAlert {
    pub reason: DispatchReason,
    pub status: VenueStatus,
    pub timeframe: String,
}

/// Everything known about one finished attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub reason: DispatchReason,
    pub request: AlertRequest,
    pub outcome: AlertOutcome,
    pub record: NotificationRecord,
    /// The request carries [`Coordinates::FALLBACK`] because no fix was available.
    pub location_fallback: bool,
}

#[derive(Clone)]
pub struct AlertDispatcher {
    transport: Arc<dyn NotificationTransport>,
    geolocator: Arc<dyn Geolocator>,
    geolocation_timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(
        transport: Arc<dyn NotificationTransport>,
        geolocator: Arc<dyn Geolocator>,
        geolocation_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            geolocator,
            geolocation_timeout,
        }
    }

    /// Send one alert. Exactly one transport call per invocation, no retries.
    pub async fn send(&self, pending: PendingAlert) -> DispatchReport {
        let (location, location_fallback) =
            match locate(self.geolocator.as_ref(), self.geolocation_timeout).await {
                Ok(coords) => (coords, false),
                Err(e) => {
                    debug!(error = %e, "Using fallback coordinates");
                    (Coordinates::FALLBACK, true)
                }
            };
        let request = AlertRequest::new(pending.timeframe.clone(), pending.status, location);

        let transport = Arc::clone(&self.transport);
        let body = request.clone();
        let result = match tokio::spawn(async move { transport.post(&body).await }).await {
            Ok(result) => result,
            Err(join_err) => Err(MonitorError::TransportFailure(format!(
                "transport task aborted: {}",
                join_err
            ))),
        };

        let outcome = AlertOutcome::from_result(result);
        if outcome.is_posted() {
            info!(reason = %pending.reason, status = %pending.status, "Alert delivered");
        } else {
            warn!(reason = %pending.reason, outcome = ?outcome, "Alert not delivered");
        }

        let record = NotificationRecord::new(pending.reason.message(), &request, &outcome);
        DispatchReport {
            reason: pending.reason,
            request,
            outcome,
            record,
            location_fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::FixedGeolocator;
    use async_trait::async_trait;
    use escalation_core::TransportReply;
    use std::sync::Mutex;

    struct Recording {
        reply: Result<TransportReply, MonitorError>,
        seen: Mutex<Vec<AlertRequest>>,
    }

    #[async_trait]
    impl NotificationTransport for Recording {
        async fn post(&self, request: &AlertRequest) -> Result<TransportReply, MonitorError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    struct Panicking;

    #[async_trait]
    impl NotificationTransport for Panicking {
        async fn post(&self, _request: &AlertRequest) -> Result<TransportReply, MonitorError> {
            panic!("transport exploded");
        }
    }

    fn pending() -> PendingAlert {
        PendingAlert {
            reason: DispatchReason::Automatic,
            status: VenueStatus::CriticalRisk,
            timeframe: "4 seconds".into(),
        }
    }

    #[tokio::test]
    async fn test_posted_alert_builds_delivered_record() {
        let transport = Arc::new(Recording {
            reply: Ok(TransportReply {
                success: true,
                message: None,
                record_id: Some("r-1".into()),
            }),
            seen: Mutex::new(Vec::new()),
        });
        let dispatcher = AlertDispatcher::new(
            transport.clone(),
            Arc::new(FixedGeolocator::new(Some(Coordinates::new(1.0, 2.0)))),
            Duration::from_secs(1),
        );

        let report = dispatcher.send(pending()).await;
        assert!(report.outcome.is_posted());
        assert!(report.record.delivered);
        assert_eq!(report.record.location, "1.0000,2.0000");
        assert!(!report.location_fallback);

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].status, "CRITICAL RISK");
        assert_eq!(seen[0].timeframe, "4 seconds");
    }

    #[tokio::test]
    async fn test_missing_location_uses_fallback() {
        let transport = Arc::new(Recording {
            reply: Ok(TransportReply::default()),
            seen: Mutex::new(Vec::new()),
        });
        let dispatcher = AlertDispatcher::new(
            transport,
            Arc::new(FixedGeolocator::new(None)),
            Duration::from_secs(1),
        );

        let report = dispatcher.send(pending()).await;
        assert_eq!(report.request.location, "40.7128,-74.0060");
        assert!(report.location_fallback);
        assert!(matches!(report.outcome, AlertOutcome::PostFailed { .. }));
        assert!(!report.record.delivered);
    }

    #[tokio::test]
    async fn test_panicking_transport_is_absorbed() {
        let dispatcher = AlertDispatcher::new(
            Arc::new(Panicking),
            Arc::new(FixedGeolocator::new(None)),
            Duration::from_secs(1),
        );

        let report = dispatcher.send(pending()).await;
        assert!(matches!(report.outcome, AlertOutcome::TransportError { .. }));
        assert_eq!(
            report.record.message,
            DispatchReason::Automatic.message()
        );
    }
}
