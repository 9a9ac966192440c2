use chrono::{DateTime, Local, Utc};
use serde::Serialize;

/// Format used when showing observation timestamps
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One timestamped scalar reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }

    /// Reading taken at the current instant
    pub fn now(value: f64) -> Self {
        Self::new(value, Utc::now())
    }

    /// Timestamp rendered in local time, e.g. `2024-11-02 14:05:00`
    pub fn display_timestamp(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format(DISPLAY_TIMESTAMP_FORMAT)
            .to_string()
    }
}
