use std::time::Duration;

use async_trait::async_trait;
use escalation_core::{Coordinates, MonitorError};

use super::Geolocator;

/// Location from configuration. `None` behaves like an unavailable fix.
pub struct FixedGeolocator {
    location: Option<Coordinates>,
}

impl FixedGeolocator {
    pub fn new(location: Option<Coordinates>) -> Self {
        Self { location }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_location(&self) -> Option<Coordinates> {
        self.location
    }
}

/// Query the geolocator with a bounded wait.
///
/// # Errors
///
/// `MonitorError::LocationUnavailable` on timeout or when no fix is reported.
pub async fn locate(geolocator: &dyn Geolocator, timeout: Duration) -> Result<Coordinates, MonitorError> {
    match tokio::time::timeout(timeout, geolocator.current_location()).await {
        Ok(Some(coords)) => Ok(coords),
        Ok(None) => Err(MonitorError::LocationUnavailable("no fix".into())),
        Err(_) => Err(MonitorError::LocationUnavailable(format!(
            "timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}
