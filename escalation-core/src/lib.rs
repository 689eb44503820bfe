//! Venue Escalation Core
//!
//! Deterministic building blocks for crowd-density monitoring:
//! - Density classification of an 8×8 occupancy grid into a venue status
//! - A critical-dwell escalation state machine with a periodic watchdog
//! - A shared cooldown gate for outbound emergency dispatches
//! - A bounded operator event log
//! - Alert wire payloads and response-plan tagging
//! - Pluggable grid samplers
//!
//! Nothing in this crate performs I/O or reads the clock for decisions; every
//! time-dependent operation takes `now` from the caller. The async runtime
//! that owns this state lives in the `venue-monitor` crate.
//!
//! # Data flow
//!
//! ```text
//! GridSampler → DensityClassifier → StatusEscalator → EventLog
//!                                         │
//!                                         └→ DispatchGate → alert dispatcher
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod density;
pub mod dispatch;
pub mod error;
pub mod escalation;
pub mod events;
pub mod plan;
pub mod sampler;

pub use density::{
    Cell, CellStatus, Classification, DensityClassifier, DensityThresholds, Grid, VenueStatus,
    GRID_COLS, GRID_ROWS,
};
pub use dispatch::{
    AlertOutcome, AlertRequest, Coordinates, DispatchGate, DispatchReason, GateDecision,
    NotificationRecord, TransportReply,
};
pub use error::MonitorError;
pub use escalation::{
    CriticalEpisode, EscalationAction, EscalationConfig, EscalationDecision, StatusEscalator,
    WatchdogVerdict,
};
pub use events::{EventLog, LogEntry, LogKind};
pub use plan::{categorize, PlanCategory, PlanLine};
pub use sampler::{CrowdCounter, GridSampler, HotspotSampler, ScriptedSampler};
