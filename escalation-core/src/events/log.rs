//! Bounded operator event log.
//!
//! Newest entries are kept at the front. Once the log holds `capacity`
//! entries, each append evicts the oldest one.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default number of entries retained.
pub const DEFAULT_LOG_CAPACITY: usize = 8;

/// Classification of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Info,
    Warning,
    Alert,
    System,
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Alert => write!(f, "alert"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A single operator-visible event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub kind: LogKind,
}

impl LogEntry {
    pub fn new(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            message: message.into(),
            kind,
        }
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {:<7} {}",
            self.timestamp.format("%H:%M:%S"),
            self.kind,
            self.message
        )
    }
}

/// Ring buffer of the most recent log entries, most-recent-first.
#[derive(Debug, Clone)]
pub struct EventLog {
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// A log holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Prepend an entry, evicting the oldest if over capacity.
    pub fn append(&mut self, kind: LogKind, message: impl Into<String>) -> &LogEntry {
        self.entries.push_front(LogEntry::new(kind, message));
        self.entries.truncate(self.capacity);
        &self.entries[0]
    }

    /// Immutable snapshot, most-recent-first.
    pub fn list(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Iterate most-recent-first without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_is_most_recent_first() {
        let mut log = EventLog::new();
        log.append(LogKind::System, "first");
        log.append(LogKind::Info, "second");
        let entries = log.list();
        assert_eq!(entries[0].message, "second");
        assert_eq!(entries[1].message, "first");
        assert_eq!(log.latest().map(|e| e.kind), Some(LogKind::Info));
    }

    #[test]
    fn test_bounded_to_capacity() {
        let mut log = EventLog::new();
        for i in 0..20 {
            log.append(LogKind::Info, format!("entry {}", i));
        }
        assert_eq!(log.len(), DEFAULT_LOG_CAPACITY);
        let messages: Vec<String> = log.iter().map(|e| e.message.clone()).collect();
        assert_eq!(messages.first().map(String::as_str), Some("entry 19"));
        assert_eq!(messages.last().map(String::as_str), Some("entry 12"));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut log = EventLog::with_capacity(4);
        let a = log.append(LogKind::Alert, "a").id.clone();
        let b = log.append(LogKind::Alert, "b").id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut log = EventLog::with_capacity(0);
        log.append(LogKind::Info, "x");
        log.append(LogKind::Info, "y");
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.list().len(), 1);
        assert_eq!(log.list()[0].message, "y");
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut log = EventLog::new();
        log.append(LogKind::Info, "before");
        let snapshot = log.list();
        log.append(LogKind::Info, "after");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
    }
}
