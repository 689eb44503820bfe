//! Escalation: critical-dwell state machine over venue status
//!
//! # Escalation Ladder
//!
//! ```text
//! Normal / High
//!     │
//!     ├─ status enters CRITICAL family → alert log, episode starts, plan requested
//!     │
//!     ▼
//! Critical episode (CriticalDensityCell ⇄ CriticalRisk keep the same episode)
//!     │
//!     ├─ drops to High or Normal → episode reset, dwell timer cancelled
//!     ├─ watchdog: dwell > 3s and not yet dispatched → automatic dispatch (once)
//!     │
//!     ▼
//! Dispatch gate (shared with manual dispatch) → alert dispatcher
//! ```

pub mod engine;
pub mod state;

pub use engine::{EscalationConfig, StatusEscalator, CRITICAL_ENTRY_SIGNAL};
pub use state::{CriticalEpisode, EscalationAction, EscalationDecision, WatchdogVerdict};
