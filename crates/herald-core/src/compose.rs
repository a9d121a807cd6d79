// Notification composition
//
// Builds the outbound payloads for the three message shapes: new event,
// rescheduled event, and the daily digest. Date formatting is fixed to one
// deployment timezone; recipients are assumed co-located, so the caller's
// zone never enters into it.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::classify::ValidEvent;
use crate::message::PushMessage;
use crate::record::NotificationKind;

/// Placeholder body segment when an event has no location set.
const LOCATION_PLACEHOLDER: &str = "Location TBA";

/// Character budget for a digest body; titles past the budget collapse into
/// a trailing count.
const DIGEST_BODY_LIMIT: usize = 512;

/// Which day a digest covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestDay {
    Today,
    Tomorrow,
}

impl DigestDay {
    fn title(&self) -> &'static str {
        match self {
            DigestDay::Today => "Happening Today",
            DigestDay::Tomorrow => "Coming Up Tomorrow",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            DigestDay::Today => "today",
            DigestDay::Tomorrow => "tomorrow",
        }
    }
}

/// Builds push payloads with deployment-fixed date formatting.
#[derive(Debug, Clone)]
pub struct NotificationComposer {
    timezone: Tz,
}

impl NotificationComposer {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Format an instant in the deployment timezone, e.g.
    /// "Mon, Jun 2 at 10:00 AM".
    pub fn format_instant(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.timezone)
            .format("%a, %b %-d at %-I:%M %p")
            .to_string()
    }

    /// Payload for a newly created (or conservatively re-announced) event.
    pub fn new_event(&self, event: &ValidEvent<'_>) -> PushMessage {
        let location = event.location.unwrap_or(LOCATION_PLACEHOLDER);
        let body = format!("{} • {}", self.format_instant(event.scheduled_at), location);

        let mut message = PushMessage::new(format!("New Event: {}", event.title), body)
            .with_data("type", NotificationKind::NewEvent.as_str())
            .with_data("eventId", event.id)
            .with_data("screen", "event_details");
        // The transport rejects an empty-string image field, so the key is
        // omitted entirely when no image is set
        if let Some(image_url) = event.image_url.filter(|url| !url.is_empty()) {
            message = message.with_data("imageUrl", image_url);
        }
        message
    }

    /// Payload for a date change. The body leads with the new instant and
    /// always carries the previous one for context.
    pub fn rescheduled(&self, event: &ValidEvent<'_>, previous: DateTime<Utc>) -> PushMessage {
        let body = format!(
            "Now {} (was {})",
            self.format_instant(event.scheduled_at),
            self.format_instant(previous)
        );

        let mut message = PushMessage::new(format!("Event Rescheduled: {}", event.title), body)
            .with_data("type", NotificationKind::DateModified.as_str())
            .with_data("eventId", event.id)
            .with_data("screen", "event_details");
        if let Some(image_url) = event.image_url.filter(|url| !url.is_empty()) {
            message = message.with_data("imageUrl", image_url);
        }
        message
    }

    /// Aggregate digest for one day partition: a bullet list of titles,
    /// truncated to a fixed character budget.
    pub fn digest(&self, day: DigestDay, titles: &[String]) -> PushMessage {
        let mut body = String::new();
        let mut included = 0usize;
        for title in titles {
            let line = format!("• {}\n", title);
            if body.len() + line.len() > DIGEST_BODY_LIMIT {
                break;
            }
            body.push_str(&line);
            included += 1;
        }
        let remaining = titles.len() - included;
        if remaining > 0 {
            body.push_str(&format!("+ {} more", remaining));
        } else {
            // Drop the trailing newline
            body.truncate(body.trim_end().len());
        }

        PushMessage::new(day.title(), body)
            .with_data("type", "daily_digest")
            .with_data("day", day.as_str())
            .with_data("count", titles.len())
    }
}
