//! External collaborators: plan generation, alert transport, geolocation.
//!
//! Each sits behind an `async_trait` so the monitor can be driven by HTTP
//! implementations in production and in-process fakes in tests. The monitor
//! never awaits these inline; calls run as spawned tasks and report back
//! through the actor's command channel.

pub mod geolocation;
pub mod planner;
pub mod transport;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use escalation_core::{AlertRequest, Coordinates, MonitorError, TransportReply};
use tracing::info;

use crate::config::MonitorConfig;

pub use geolocation::{locate, FixedGeolocator};
pub use planner::GeminiPlanner;
pub use transport::HttpAlertTransport;

/// Generates a response plan for a density signal.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Opaque, non-empty plan text.
    ///
    /// A reply without text is `PlannerFailure` carrying [`EMPTY_RESPONSE`].
    ///
    /// [`EMPTY_RESPONSE`]: escalation_core::plan::EMPTY_RESPONSE
    async fn generate_plan(&self, density_signal: u32) -> Result<String, MonitorError>;
}

/// Posts an emergency notification.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// `Ok` with `success == false` for a non-success answer; `Err` for transport errors.
    async fn post(&self, request: &AlertRequest) -> Result<TransportReply, MonitorError>;
}

/// Reports the venue's current location.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_location(&self) -> Option<Coordinates>;
}

/// The full set of collaborators the monitor talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub planner: Arc<dyn Planner>,
    pub transport: Arc<dyn NotificationTransport>,
    pub geolocator: Arc<dyn Geolocator>,
}

impl Collaborators {
    /// HTTP-backed collaborators built from configuration.
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        let planner = GeminiPlanner::from_config(&config.planner)?;
        let transport = HttpAlertTransport::from_config(&config.alert)?;
        info!(
            planner_simulation = planner.is_simulation(),
            alert_url = transport.url(),
            fixed_location = config.location.is_some(),
            "Collaborators configured"
        );
        Ok(Self {
            planner: Arc::new(planner),
            transport: Arc::new(transport),
            geolocator: Arc::new(FixedGeolocator::new(config.location)),
        })
    }
}
