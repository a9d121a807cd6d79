// Durable notification records
//
// One record per event id, written after a notification is sent. Presence of
// a record means a notification has gone out for the event's current or a
// prior scheduled instant; the engine treats an absent record conservatively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which notification shape was last sent for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewEvent,
    DateModified,
}

impl NotificationKind {
    /// Wire value used as the `type` discriminator in push payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewEvent => "new_event",
            NotificationKind::DateModified => "date_modified",
        }
    }
}

/// Durable record of the last notification sent for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub event_id: String,
    pub event_title: String,
    pub kind: NotificationKind,
    /// Scheduled instant at the time of the last send
    pub last_notified_date: DateTime<Utc>,
    /// Wall-clock time of the send
    pub notified_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn new(
        event_id: impl Into<String>,
        event_title: impl Into<String>,
        kind: NotificationKind,
        last_notified_date: DateTime<Utc>,
        notified_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_title: event_title.into(),
            kind,
            last_notified_date,
            notified_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kind_wire_values() {
        assert_eq!(NotificationKind::NewEvent.as_str(), "new_event");
        assert_eq!(NotificationKind::DateModified.as_str(), "date_modified");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = NotificationRecord::new(
            "evt-1",
            "Launch",
            NotificationKind::NewEvent,
            Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 5, 30, 9, 0, 0).unwrap(),
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["eventId"], "evt-1");
        assert_eq!(json["kind"], "new_event");
        assert!(json["lastNotifiedDate"].is_string());
    }
}
