//! Read-only view of the monitor for the CLI and other observers.

use std::time::Duration;

use escalation_core::{Grid, LogEntry, NotificationRecord, PlanLine, VenueStatus};
use serde::{Deserialize, Serialize};

use super::state::Phase;

/// Point-in-time view of the monitor, safe to hand to any observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub phase: Phase,
    pub status: VenueStatus,
    /// Display label; `"Initializing"` until the boot sequence completes.
    pub status_label: String,
    pub generation: u64,
    pub grid: Grid,
    pub total_persons: u32,
    pub max_cell_density: u32,
    pub high_cells: usize,
    pub critical_cells: usize,
    /// Whole seconds until the next dispatch is allowed (0 = ready).
    pub cooldown_remaining_secs: u64,
    pub critical_elapsed: Option<Duration>,
    pub plan: Option<String>,
    pub plan_lines: Vec<PlanLine>,
    pub plan_in_flight: bool,
    /// Most recent first.
    pub log: Vec<LogEntry>,
    pub last_notification: Option<NotificationRecord>,
}

impl MonitorSnapshot {
    pub fn is_critical(&self) -> bool {
        self.status.is_critical()
    }

    pub fn dispatch_ready(&self) -> bool {
        self.cooldown_remaining_secs == 0
    }
}
