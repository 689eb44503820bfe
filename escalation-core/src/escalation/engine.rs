//! Status Escalator: deterministic state machine over venue status
//!
//! Consumes classified snapshots and periodic watchdog ticks, and decides
//! when an automatic dispatch is warranted. Time is always passed in by the
//! caller; the escalator never reads the clock itself.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::density::VenueStatus;
use crate::dispatch::DispatchReason;
use crate::escalation::state::{
    CriticalEpisode, EscalationAction, EscalationDecision, WatchdogVerdict,
};
use crate::events::LogKind;

/// Density signal sent to the planner when the venue turns critical.
pub const CRITICAL_ENTRY_SIGNAL: u32 = 300;

/// Configuration for the escalator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Continuous critical dwell that must be exceeded before the automatic dispatch.
    pub critical_dwell: Duration,
    /// Density signal for the plan requested on critical entry.
    pub critical_entry_signal: u32,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            critical_dwell: Duration::from_secs(3),
            critical_entry_signal: CRITICAL_ENTRY_SIGNAL,
        }
    }
}

/// The status escalator.
///
/// Starts at `Normal`; the boot sequence that precedes monitoring is the
/// caller's concern.
#[derive(Debug, Clone)]
pub struct StatusEscalator {
    config: EscalationConfig,
    current: VenueStatus,
    episode: CriticalEpisode,
}

impl StatusEscalator {
    pub fn new() -> Self {
        Self::with_config(EscalationConfig::default())
    }

    pub fn with_config(config: EscalationConfig) -> Self {
        Self {
            config,
            current: VenueStatus::Normal,
            episode: CriticalEpisode::default(),
        }
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// The last recorded venue status.
    pub fn current(&self) -> VenueStatus {
        self.current
    }

    pub fn episode(&self) -> &CriticalEpisode {
        &self.episode
    }

    /// Elapsed time in the running critical episode.
    pub fn critical_elapsed(&self, now: Instant) -> Option<Duration> {
        self.episode.elapsed(now)
    }

    /// Record a freshly classified status.
    ///
    /// Returns `None` when the status is unchanged; transitions fire only on change.
    /// This is the authoritative writer for episode resets.
    pub fn observe(&mut self, status: VenueStatus, now: Instant) -> Option<EscalationDecision> {
        if status == self.current {
            return None;
        }

        let from = self.current;
        self.current = status;

        let mut actions = Vec::new();
        let mut episode_started = false;
        let was_active = self.episode.is_active();

        if status.is_critical() {
            actions.push(EscalationAction::Log {
                kind: LogKind::Alert,
                message: format!("STATUS ALERT: {}", status),
            });
            // Moves within the critical family keep the running episode.
            if !from.is_critical() {
                if !was_active {
                    self.episode.start(now);
                    episode_started = true;
                }
                actions.push(EscalationAction::RequestPlan {
                    density_signal: self.config.critical_entry_signal,
                });
            }
        } else {
            let (kind, message) = if status.is_high() {
                (LogKind::Warning, format!("Warning: {}", status))
            } else {
                (LogKind::Info, "Status normal".to_string())
            };
            actions.push(EscalationAction::Log { kind, message });
            self.episode.reset();
        }

        let episode_ended = was_active && !self.episode.is_active();
        info!(
            from = %from,
            to = %status,
            episode_started,
            episode_ended,
            "Venue status changed"
        );

        Some(EscalationDecision {
            from,
            to: status,
            episode_started,
            episode_ended,
            actions,
        })
    }

    /// Periodic critical-dwell check.
    ///
    /// Emits `WatchdogVerdict::Dispatch` at most once per episode. The episode's
    /// dispatch flag is set here, before the dispatch is attempted, so a failed
    /// attempt is never retried within the same episode.
    pub fn watchdog(&mut self, now: Instant) -> WatchdogVerdict {
        if !self.current.is_critical() {
            if self.episode.is_active() {
                // Transitions already reset the episode; reaching this means one was missed.
                debug!(status = %self.current, "Watchdog cleared stale critical episode");
                self.episode.reset();
                return WatchdogVerdict::StaleEpisodeCleared;
            }
            return WatchdogVerdict::Idle;
        }

        let Some(elapsed) = self.episode.elapsed(now) else {
            self.episode.start(now);
            debug!(status = %self.current, "Watchdog started critical episode");
            return WatchdogVerdict::EpisodeStarted;
        };

        if self.episode.dispatch_sent() {
            return WatchdogVerdict::AlreadyDispatched { elapsed };
        }

        if elapsed > self.config.critical_dwell {
            self.episode.mark_dispatched();
            info!(
                elapsed_ms = elapsed.as_millis() as u64,
                status = %self.current,
                "Critical dwell exceeded; automatic dispatch"
            );
            return WatchdogVerdict::Dispatch {
                reason: DispatchReason::Automatic,
                elapsed,
            };
        }

        WatchdogVerdict::Dwelling { elapsed }
    }
}

impl Default for StatusEscalator {
    fn default() -> Self {
        Self::new()
    }
}
