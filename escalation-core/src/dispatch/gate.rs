//! Dispatch cooldown gate.
//!
//! At most one outbound alert per cooldown window, whatever triggered it.
//! The window starts when a dispatch is accepted, not when the remote side
//! confirms it. Requests inside the window are rejected, never queued.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default cooldown between dispatches.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// What triggered a dispatch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchReason {
    /// Critical dwell exceeded.
    Automatic,
    /// Operator authorization.
    Manual,
}

impl DispatchReason {
    /// Message carried by the emergency notification.
    pub fn message(self) -> &'static str {
        match self {
            Self::Automatic => {
                "Automated critical risk detected for venue. Immediate assistance required."
            }
            Self::Manual => {
                "Manual dispatch authorized by operator. Immediate medical assistance requested."
            }
        }
    }
}

impl std::fmt::Display for DispatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Verdict of [`DispatchGate::try_dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Exactly one send is permitted; the window now runs until `active_until`.
    Accepted { active_until: Instant },
    /// A window is active; nothing may be sent.
    RejectedCooldown { remaining: Duration },
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Process-wide cooldown window shared by automatic and manual dispatch.
#[derive(Debug, Clone)]
pub struct DispatchGate {
    cooldown: Duration,
    active_until: Option<Instant>,
}

impl DispatchGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            active_until: None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// End of the current window, if one was ever opened.
    pub fn active_until(&self) -> Option<Instant> {
        self.active_until
    }

    /// Time left in the window (zero when ready).
    pub fn remaining(&self, now: Instant) -> Duration {
        self.active_until
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Remaining time rounded up to whole seconds (0 = ready).
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        let remaining = self.remaining(now);
        let secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    /// Ask to send one alert.
    pub fn try_dispatch(&mut self, reason: DispatchReason, now: Instant) -> GateDecision {
        let remaining = self.remaining(now);
        if remaining > Duration::ZERO {
            debug!(
                %reason,
                remaining_ms = remaining.as_millis() as u64,
                "Dispatch rejected: cooldown active"
            );
            return GateDecision::RejectedCooldown { remaining };
        }

        let active_until = now + self.cooldown;
        self.active_until = Some(active_until);
        info!(
            %reason,
            cooldown_secs = self.cooldown.as_secs(),
            "Dispatch accepted"
        );
        GateDecision::Accepted { active_until }
    }
}

impl Default for DispatchGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_starts_open() {
        let mut gate = DispatchGate::default();
        let t0 = Instant::now();
        assert_eq!(gate.remaining(t0), Duration::ZERO);
        assert_eq!(gate.remaining_secs(t0), 0);
        assert!(gate.try_dispatch(DispatchReason::Manual, t0).is_accepted());
    }

    #[test]
    fn test_rejects_inside_window() {
        let mut gate = DispatchGate::default();
        let t0 = Instant::now();
        gate.try_dispatch(DispatchReason::Automatic, t0);
        let decision = gate.try_dispatch(DispatchReason::Manual, t0 + Duration::from_millis(500));
        assert_eq!(
            decision,
            GateDecision::RejectedCooldown {
                remaining: Duration::from_millis(29_500)
            }
        );
        // A rejection does not extend the window.
        assert_eq!(gate.active_until(), Some(t0 + DEFAULT_COOLDOWN));
    }

    #[test]
    fn test_accepts_exactly_at_window_end() {
        let mut gate = DispatchGate::default();
        let t0 = Instant::now();
        gate.try_dispatch(DispatchReason::Manual, t0);
        let at_end = t0 + DEFAULT_COOLDOWN;
        assert!(gate.try_dispatch(DispatchReason::Manual, at_end).is_accepted());
        assert!(!gate
            .try_dispatch(DispatchReason::Manual, at_end)
            .is_accepted());
    }

    #[test]
    fn test_remaining_secs_rounds_up() {
        let mut gate = DispatchGate::new(Duration::from_secs(30));
        let t0 = Instant::now();
        gate.try_dispatch(DispatchReason::Automatic, t0);
        assert_eq!(gate.remaining_secs(t0), 30);
        assert_eq!(gate.remaining_secs(t0 + Duration::from_millis(100)), 30);
        assert_eq!(gate.remaining_secs(t0 + Duration::from_millis(29_001)), 1);
        assert_eq!(gate.remaining_secs(t0 + Duration::from_secs(31)), 0);
    }

    #[test]
    fn test_reason_messages_differ() {
        assert_ne!(
            DispatchReason::Automatic.message(),
            DispatchReason::Manual.message()
        );
        assert_eq!(DispatchReason::Manual.to_string(), "manual");
    }
}
