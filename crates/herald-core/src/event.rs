// Event documents and change-feed records
//
// Events are external, read-only documents; the fields we depend on may be
// missing or malformed, so everything optional stays Option until validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::TimestampValue;

/// An event document as it exists in the store.
///
/// An event lacking a title or a coercible scheduled date is invalid and is
/// skipped before any classification runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Opaque stable identifier, unique within the store
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<TimestampValue>,

    /// Inactive events are never notified
    #[serde(default)]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Event {
    /// The normalized scheduled instant, if one can be coerced.
    pub fn scheduled_instant(&self) -> Option<DateTime<Utc>> {
        self.scheduled_at.as_ref().and_then(TimestampValue::to_instant)
    }
}

/// Kind of mutation reported by the change subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One document mutation from the change stream.
///
/// The event is the post-change snapshot; on `Removed` only the id survives,
/// the remaining fields come back absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub event: Event,
}

impl ChangeRecord {
    pub fn added(event: Event) -> Self {
        Self {
            kind: ChangeKind::Added,
            event,
        }
    }

    pub fn modified(event: Event) -> Self {
        Self {
            kind: ChangeKind::Modified,
            event,
        }
    }

    pub fn removed(event_id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Removed,
            event: Event {
                id: event_id.into(),
                title: None,
                scheduled_at: None,
                is_active: false,
                location: None,
                image_url: None,
            },
        }
    }
}

/// A group of mutations delivered together by the subscription.
///
/// Same-id changes keep their stream order; there is no ordering requirement
/// across different ids.
pub type ChangeBatch = Vec<ChangeRecord>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_deserializes_from_store_shape() {
        let event: Event = serde_json::from_str(
            r#"{
                "id": "evt-1",
                "title": "Launch",
                "scheduledAt": {"seconds": 1748772000, "nanoseconds": 0},
                "isActive": true,
                "location": "Main Hall"
            }"#,
        )
        .unwrap();

        assert_eq!(event.id, "evt-1");
        assert!(event.is_active);
        assert_eq!(
            event.scheduled_instant(),
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(event.image_url, None);
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let event: Event = serde_json::from_str(r#"{"id": "evt-2"}"#).unwrap();

        assert_eq!(event.title, None);
        assert_eq!(event.scheduled_instant(), None);
        assert!(!event.is_active);
    }

    #[test]
    fn test_removed_change_has_bare_event() {
        let change = ChangeRecord::removed("evt-3");

        assert_eq!(change.kind, ChangeKind::Removed);
        assert_eq!(change.event.id, "evt-3");
        assert_eq!(change.event.title, None);
    }
}
