//! Operator-facing event log.

pub mod log;

pub use log::{EventLog, LogEntry, LogKind, DEFAULT_LOG_CAPACITY};
