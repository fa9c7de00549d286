use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// The append-only structured log record shape named in the error handling
/// design. `tracing` emits these as structured fields rather than as a
/// serialized struct in production, but the shape is kept explicit here so
/// tests and the `/status` surface can reason about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub service: String,
    pub store_id: Option<i64>,
    pub source: String,
    pub message: String,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}
