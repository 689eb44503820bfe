//! Dispatch: the shared cooldown gate and the alert wire model.

pub mod alert;
pub mod gate;

pub use alert::{
    format_timeframe, AlertOutcome, AlertRequest, Coordinates, NotificationRecord, TransportReply,
    FALLBACK_TIMEFRAME,
};
pub use gate::{DispatchGate, DispatchReason, GateDecision, DEFAULT_COOLDOWN};
