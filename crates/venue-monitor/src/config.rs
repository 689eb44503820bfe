//! Monitor configuration.
//!
//! Built from defaults, then overridden by `VENUE_*` environment variables
//! (`GEMINI_API_KEY` for the planner). Unparseable values are logged and
//! ignored so a bad variable never prevents startup.

use std::str::FromStr;
use std::time::Duration;

use escalation_core::density::DensityThresholds;
use escalation_core::dispatch::DEFAULT_COOLDOWN;
use escalation_core::escalation::EscalationConfig;
use escalation_core::events::DEFAULT_LOG_CAPACITY;
use escalation_core::Coordinates;
use tracing::warn;

/// Alert endpoint configuration (the notification transport).
#[derive(Debug, Clone)]
pub struct AlertEndpoint {
    pub url: String,
    pub timeout: Duration,
}

/// Plan generation endpoint (Gemini `generateContent`).
#[derive(Debug, Clone)]
pub struct PlannerEndpoint {
    pub base_url: String,
    /// `None` puts the planner in simulation mode.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

/// Top-level monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Sampling/classification cadence.
    pub sample_interval: Duration,
    /// Critical-dwell watchdog cadence.
    pub watchdog_interval: Duration,
    pub thresholds: DensityThresholds,
    pub escalation: EscalationConfig,
    /// Minimum gap between two dispatch attempts.
    pub dispatch_cooldown: Duration,
    pub log_capacity: usize,
    pub alert: AlertEndpoint,
    pub planner: PlannerEndpoint,
    /// Configured venue location; `None` means geolocation is unavailable.
    pub location: Option<Coordinates>,
    pub geolocation_timeout: Duration,
    /// Seed for the hotspot sampler and crowd counter (None = OS entropy).
    pub sampler_seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(500),
            watchdog_interval: Duration::from_secs(1),
            thresholds: DensityThresholds::default(),
            escalation: EscalationConfig::default(),
            dispatch_cooldown: DEFAULT_COOLDOWN,
            log_capacity: DEFAULT_LOG_CAPACITY,
            alert: AlertEndpoint {
                url: "http://127.0.0.1:5001/api/send-alert".into(),
                timeout: Duration::from_secs(10),
            },
            planner: PlannerEndpoint {
                base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
                api_key: None,
                model: "gemini-2.5-flash".into(),
                timeout: Duration::from_secs(30),
            },
            location: None,
            geolocation_timeout: Duration::from_secs(5),
            sampler_seed: None,
        }
    }
}

impl MonitorConfig {
    /// Defaults overlaid with `VENUE_*` / `GEMINI_API_KEY` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env_parse::<u64>("VENUE_SAMPLE_INTERVAL_MS") {
            config.sample_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = env_parse::<u64>("VENUE_WATCHDOG_INTERVAL_MS") {
            config.watchdog_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = env_parse::<u64>("VENUE_CRITICAL_DWELL_MS") {
            config.escalation.critical_dwell = Duration::from_millis(ms);
        }
        if let Some(secs) = env_parse::<u64>("VENUE_DISPATCH_COOLDOWN_SECS") {
            config.dispatch_cooldown = Duration::from_secs(secs);
        }
        if let Ok(url) = std::env::var("VENUE_ALERT_URL") {
            config.alert.url = url;
        }
        config.planner.api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        if let Ok(model) = std::env::var("VENUE_PLANNER_MODEL") {
            config.planner.model = model;
        }
        config.location = match (env_parse::<f64>("VENUE_LAT"), env_parse::<f64>("VENUE_LON")) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        };
        config.sampler_seed = env_parse::<u64>("VENUE_SAMPLER_SEED");

        config
    }
}

/// Parse an environment variable, ignoring (with a warning) values that don't parse.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment value");
            None
        }
    }
}
