//! Activity Log Entries
//!
//! Append-only records of score, point and deposit changes, queried per user
//! and type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of activity a log entry records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    Score,
    Point,
    Deposit,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Score => "score",
            LogType::Point => "point",
            LogType::Deposit => "deposit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "score" => Some(LogType::Score),
            "point" => Some(LogType::Point),
            "deposit" => Some(LogType::Deposit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogMeta {
    #[serde(rename = "type")]
    pub log_type: LogType,
    pub uid: String,
    /// Signed amount the entry records
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub meta: LogMeta,
}
