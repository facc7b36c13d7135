//! Descriptive metadata values.
//!
//! Attribute values arrive from callers as either plain text or timestamps.
//! Each variant has an explicit canonical rendering; the rendered string is
//! what the backend deduplicates on, so the format must stay fixed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed rendering for timestamp values.
const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S UTC";

/// One descriptive metadata value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl AttributeValue {
    /// Canonical string form used for storage and deduplication.
    pub fn render(&self) -> String {
        match self {
            AttributeValue::Text(s) => s.clone(),
            AttributeValue::Timestamp(t) => t.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Returns `true` for values that must be skipped (never stored).
    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Text(s) => s.trim().is_empty(),
            AttributeValue::Timestamp(_) => false,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(t: DateTime<Utc>) -> Self {
        AttributeValue::Timestamp(t)
    }
}
