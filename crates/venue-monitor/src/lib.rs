//! Venue Monitor
//!
//! Async runtime around `escalation-core`: a single-writer actor that owns
//! the escalation state, two periodic schedules (sampling and the
//! critical-dwell watchdog), and the external collaborators it calls out to.
//!
//! # Modules
//!
//! - [`config`]: `MonitorConfig` from defaults and `VENUE_*` environment variables
//! - [`collaborators`]: planner, notification transport and geolocation traits with HTTP implementations
//! - [`dispatcher`]: one alert attempt, from location lookup to notification record
//! - [`monitor`]: the owned state, the actor and its handle
//! - [`telemetry`]: tracing setup and text rendering

pub mod collaborators;
pub mod config;
pub mod dispatcher;
pub mod monitor;
pub mod telemetry;

pub use collaborators::Collaborators;
pub use config::MonitorConfig;
pub use dispatcher::{AlertDispatcher, DispatchReport, PendingAlert};
pub use monitor::{spawn_monitor, MonitorHandle, MonitorSnapshot, Phase};
