// Audit log rows
//
// Every successful send and every dispatch failure is persisted to a log
// collection so failures stay auditable even when the immediate caller
// discards the returned error. getStats reads these back, newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row appended after a successful dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLogEntry {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub title: String,
    pub body: String,
    /// Topic name or device token the message went to
    pub target: String,
    /// Message id returned by the transport
    pub message_id: String,
    pub sent_at: DateTime<Utc>,
}

impl SendLogEntry {
    pub fn new(
        event_id: Option<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        target: impl Into<String>,
        message_id: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_id,
            title: title.into(),
            body: body.into(),
            target: target.into(),
            message_id: message_id.into(),
            sent_at,
        }
    }
}

/// Row appended when the transport rejects a dispatch.
///
/// Carries the original title/body so the failed message can be audited or
/// replayed by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogEntry {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub title: String,
    pub body: String,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

impl ErrorLogEntry {
    pub fn new(
        event_id: Option<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        error: impl Into<String>,
        failed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_id,
            title: title.into(),
            body: body.into(),
            error: error.into(),
            failed_at,
        }
    }
}
