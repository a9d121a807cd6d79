// Change classification
//
// Pure decision logic: the engine performs lookups and hands the results in,
// so every path here is a plain function of its arguments. Validation always
// precedes classification, in a fixed order: structure, activity flag, then
// the past check.

use chrono::{DateTime, Utc};

use crate::event::Event;

/// Why a change was skipped before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Missing title or scheduled date that does not coerce to an instant
    MissingFields,
    /// Event is flagged inactive
    Inactive,
    /// Scheduled instant is at or before the current time
    Past,
}

/// A validated view of an event: title and instant are guaranteed present.
#[derive(Debug, Clone, Copy)]
pub struct ValidEvent<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub scheduled_at: DateTime<Utc>,
    pub location: Option<&'a str>,
    pub image_url: Option<&'a str>,
}

/// Structural validation only: title present, scheduled date coercible.
///
/// The manual notify path uses this directly since it bypasses the activity
/// and past checks.
pub fn validate_structure(event: &Event) -> std::result::Result<ValidEvent<'_>, SkipReason> {
    let title = match event.title.as_deref() {
        Some(t) if !t.is_empty() => t,
        _ => return Err(SkipReason::MissingFields),
    };
    let scheduled_at = match event.scheduled_instant() {
        Some(instant) => instant,
        None => return Err(SkipReason::MissingFields),
    };

    Ok(ValidEvent {
        id: &event.id,
        title,
        scheduled_at,
        location: event.location.as_deref(),
        image_url: event.image_url.as_deref(),
    })
}

/// Validate an event snapshot against the current time.
pub fn validate(event: &Event, now: DateTime<Utc>) -> std::result::Result<ValidEvent<'_>, SkipReason> {
    let valid = validate_structure(event)?;
    if !event.is_active {
        return Err(SkipReason::Inactive);
    }
    if valid.scheduled_at <= now {
        return Err(SkipReason::Past);
    }
    Ok(valid)
}

/// Decision for an `added` change, given the durable record lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddedAction {
    /// A record exists: do not send, re-sync the cache to the record's
    /// last notified instant so cache and store cannot diverge
    AlreadyNotified(DateTime<Utc>),
    /// No record: this is a genuinely new event
    New,
}

pub fn classify_added(last_notified: Option<DateTime<Utc>>) -> AddedAction {
    match last_notified {
        Some(instant) => AddedAction::AlreadyNotified(instant),
        None => AddedAction::New,
    }
}

/// Decision for a `modified` change, given the resolved previous instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifiedAction {
    /// Neither cache nor store knows a previous instant: fall back to a
    /// new-event notification rather than staying silent
    NotifyAsNew,
    /// The scheduled instant moved
    Rescheduled { previous: DateTime<Utc> },
    /// Same instant: no send, but the cache is still refreshed
    Unchanged,
}

pub fn classify_modified(
    previous: Option<DateTime<Utc>>,
    current: DateTime<Utc>,
) -> ModifiedAction {
    match previous {
        None => ModifiedAction::NotifyAsNew,
        Some(prev) if prev != current => ModifiedAction::Rescheduled { previous: prev },
        Some(_) => ModifiedAction::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimestampValue;
    use chrono::TimeZone;

    fn event(title: Option<&str>, scheduled: Option<TimestampValue>, active: bool) -> Event {
        Event {
            id: "evt-1".to_string(),
            title: title.map(String::from),
            scheduled_at: scheduled,
            is_active: active,
            location: None,
            image_url: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn future() -> TimestampValue {
        TimestampValue::DateTime(Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap())
    }

    #[test]
    fn test_missing_title_is_invalid() {
        let e = event(None, Some(future()), true);
        let result = validate(&e, now());
        assert_eq!(result.unwrap_err(), SkipReason::MissingFields);
    }

    #[test]
    fn test_empty_title_is_invalid() {
        let e = event(Some(""), Some(future()), true);
        let result = validate(&e, now());
        assert_eq!(result.unwrap_err(), SkipReason::MissingFields);
    }

    #[test]
    fn test_missing_date_is_invalid() {
        let e = event(Some("Launch"), None, true);
        let result = validate(&e, now());
        assert_eq!(result.unwrap_err(), SkipReason::MissingFields);
    }

    #[test]
    fn test_uncoercible_date_is_invalid() {
        let scheduled = TimestampValue::Text("not a date".to_string());
        let e = event(Some("Launch"), Some(scheduled), true);
        let result = validate(&e, now());
        assert_eq!(result.unwrap_err(), SkipReason::MissingFields);
    }

    #[test]
    fn test_inactive_is_skipped() {
        let e = event(Some("Launch"), Some(future()), false);
        let result = validate(&e, now());
        assert_eq!(result.unwrap_err(), SkipReason::Inactive);
    }

    #[test]
    fn test_past_is_skipped() {
        let past = TimestampValue::DateTime(Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap());
        let e = event(Some("Launch"), Some(past), true);
        let result = validate(&e, now());
        assert_eq!(result.unwrap_err(), SkipReason::Past);
    }

    #[test]
    fn test_exactly_now_counts_as_past() {
        let at_now = TimestampValue::DateTime(now());
        let e = event(Some("Launch"), Some(at_now), true);
        let result = validate(&e, now());
        assert_eq!(result.unwrap_err(), SkipReason::Past);
    }

    #[test]
    fn test_valid_event_passes() {
        let e = event(Some("Launch"), Some(future()), true);
        let valid = validate(&e, now()).unwrap();

        assert_eq!(valid.id, "evt-1");
        assert_eq!(valid.title, "Launch");
        assert_eq!(
            valid.scheduled_at,
            Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_structure_checked_before_activity() {
        // Missing title on an inactive event reports the structural problem
        let e = event(None, Some(future()), false);
        let result = validate(&e, now());
        assert_eq!(result.unwrap_err(), SkipReason::MissingFields);
    }

    #[test]
    fn test_added_with_record_is_already_notified() {
        let last = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        assert_eq!(
            classify_added(Some(last)),
            AddedAction::AlreadyNotified(last)
        );
    }

    #[test]
    fn test_added_without_record_is_new() {
        assert_eq!(classify_added(None), AddedAction::New);
    }

    #[test]
    fn test_modified_without_history_notifies_as_new() {
        let current = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        assert_eq!(classify_modified(None, current), ModifiedAction::NotifyAsNew);
    }

    #[test]
    fn test_modified_with_moved_instant_is_rescheduled() {
        let previous = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        let current = Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap();

        assert_eq!(
            classify_modified(Some(previous), current),
            ModifiedAction::Rescheduled { previous }
        );
    }

    #[test]
    fn test_modified_with_same_instant_is_unchanged() {
        let instant = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        assert_eq!(
            classify_modified(Some(instant), instant),
            ModifiedAction::Unchanged
        );
    }
}
