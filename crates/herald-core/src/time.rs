// Timestamp normalization
//
// The document store hands back scheduled dates in whatever shape the writer
// used: a native timestamp, an epoch-seconds wrapper, or an ISO-8601 string.
// Everything downstream compares instants, so this module is the single place
// where raw representations become a DateTime<Utc>. Two representations of
// the same instant must compare equal after coercion.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled-date value as stored, before normalization.
///
/// Untagged: deserialization tries each shape in order. RFC 3339 strings are
/// captured by the native variant; `Text` catches the looser ISO forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampValue {
    /// Native timestamp (serialized as RFC 3339)
    DateTime(DateTime<Utc>),

    /// Epoch-seconds wrapper, the document store's timestamp object shape
    Seconds {
        seconds: i64,
        #[serde(default)]
        nanoseconds: u32,
    },

    /// ISO-8601 text that did not parse as strict RFC 3339
    Text(String),
}

impl TimestampValue {
    /// Normalize to the canonical comparison instant.
    ///
    /// Returns `None` when the value cannot represent a point in time
    /// (out-of-range epoch, unparseable text); callers treat that as a
    /// missing scheduled date.
    pub fn to_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            TimestampValue::DateTime(dt) => Some(*dt),
            TimestampValue::Seconds {
                seconds,
                nanoseconds,
            } => Utc.timestamp_opt(*seconds, *nanoseconds).single(),
            TimestampValue::Text(text) => parse_iso(text),
        }
    }
}

impl From<DateTime<Utc>> for TimestampValue {
    fn from(dt: DateTime<Utc>) -> Self {
        TimestampValue::DateTime(dt)
    }
}

fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    // Date-only form, midnight UTC
    if let Ok(date) = chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}
