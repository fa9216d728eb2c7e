use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Console level a record was produced at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Log,
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    pub const ALL: [Level; 5] = [Level::Log, Level::Error, Level::Warn, Level::Info, Level::Debug];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Log => "log",
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
        }
    }

    /// Level used when the record is written through the `log` facade.
    pub fn native(self) -> log::Level {
        match self {
            Level::Log | Level::Info => log::Level::Info,
            Level::Error => log::Level::Error,
            Level::Warn => log::Level::Warn,
            Level::Debug => log::Level::Debug,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single console call captured for shipping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    /// ISO 8601 UTC timestamp, millisecond precision
    pub timestamp: String,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: now_iso(),
        }
    }
}

/// Current time formatted like `2024-05-01T12:00:00.000Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Insertion-ordered queue of records waiting for the next flush.
#[derive(Debug, Default)]
pub struct LogQueue {
    entries: VecDeque<LogRecord>,
}

impl LogQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: LogRecord) {
        self.entries.push_back(record);
    }

    /// Takes every queued record, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<LogRecord> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Body posted to the ingest endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogPayload {
    pub logs: Vec<LogRecord>,
}
