//! Escalation State: the critical episode and the decisions the engine emits

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::density::VenueStatus;
use crate::dispatch::DispatchReason;
use crate::events::LogKind;

/// A continuous dwell in the CRITICAL family.
///
/// `started_at` is `None` whenever the venue is not critical. The
/// `dispatch_sent` flag is scoped to the episode: it is cleared whenever a
/// new episode starts or the current one resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CriticalEpisode {
    started_at: Option<Instant>,
    dispatch_sent: bool,
}

impl CriticalEpisode {
    /// Begin a new episode at `now`.
    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.dispatch_sent = false;
    }

    /// End the episode.
    pub fn reset(&mut self) {
        self.started_at = None;
        self.dispatch_sent = false;
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Time spent critical so far, if an episode is running.
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.started_at
            .map(|started| now.saturating_duration_since(started))
    }

    pub fn dispatch_sent(&self) -> bool {
        self.dispatch_sent
    }

    /// Record that this episode's automatic dispatch has been attempted.
    pub fn mark_dispatched(&mut self) {
        self.dispatch_sent = true;
    }
}

/// Side effect requested by the escalator. The owner of the state applies these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationAction {
    /// Append an operator log entry.
    Log { kind: LogKind, message: String },
    /// Ask the planner for a response plan, unless one is already in flight.
    RequestPlan { density_signal: u32 },
}

/// Result of a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDecision {
    pub from: VenueStatus,
    pub to: VenueStatus,
    /// Whether this change began a new critical episode.
    pub episode_started: bool,
    /// Whether this change ended a critical episode.
    pub episode_ended: bool,
    pub actions: Vec<EscalationAction>,
}

impl EscalationDecision {
    /// The plan request carried by this decision, if any.
    pub fn plan_request(&self) -> Option<u32> {
        self.actions.iter().find_map(|a| match a {
            EscalationAction::RequestPlan { density_signal } => Some(*density_signal),
            _ => None,
        })
    }
}

/// Outcome of one watchdog evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogVerdict {
    /// Not critical and no episode to clear.
    Idle,
    /// Critical with no recorded start; the episode starts now.
    EpisodeStarted,
    /// Critical, but the dwell threshold has not been exceeded yet.
    Dwelling { elapsed: Duration },
    /// Dwell exceeded: fire the automatic dispatch. Emitted once per episode.
    Dispatch {
        reason: DispatchReason,
        elapsed: Duration,
    },
    /// This episode's automatic dispatch was already attempted.
    AlreadyDispatched { elapsed: Duration },
    /// Not critical, but an episode was still recorded; it has been cleared.
    StaleEpisodeCleared,
}
