// Daily digest behavior: day partitioning in the deployment timezone,
// empty partitions, ordering, and tolerance for malformed events.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use herald_core::memory::{CollectingNotifier, InMemoryDocumentStore, ManualClock};
use herald_core::{Event, NotificationComposer, TimestampValue};
use herald_worker::{Dispatcher, ReminderScheduler};

fn event_at(id: &str, title: &str, scheduled: DateTime<Utc>) -> Event {
    Event {
        id: id.to_string(),
        title: Some(title.to_string()),
        scheduled_at: Some(TimestampValue::DateTime(scheduled)),
        is_active: true,
        location: None,
        image_url: None,
    }
}

fn fixture(
    now: DateTime<Utc>,
) -> (
    Arc<InMemoryDocumentStore>,
    Arc<CollectingNotifier>,
    ReminderScheduler,
) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let notifier = Arc::new(CollectingNotifier::new());
    let clock = Arc::new(ManualClock::new(now));
    let timezone = chrono_tz::America::New_York;
    let dispatcher = Dispatcher::new(store.clone(), notifier.clone(), clock.clone());
    let scheduler = ReminderScheduler::new(
        store.clone(),
        dispatcher,
        clock,
        NotificationComposer::new(timezone),
        timezone,
        "events",
        8,
    );
    (store, notifier, scheduler)
}

#[tokio::test]
async fn digest_partitions_today_and_tomorrow_in_deployment_zone() {
    // Noon New York on Sunday 2025-06-01 (16:00 UTC)
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 16, 0, 0).unwrap();
    let (store, notifier, scheduler) = fixture(now);

    // Today 6 PM New York
    store
        .seed_event(event_at(
            "today-evening",
            "Launch",
            Utc.with_ymd_and_hms(2025, 6, 1, 22, 0, 0).unwrap(),
        ))
        .await;
    // Today 11:30 PM New York, which is already June 2 in UTC; the
    // partition must follow the deployment zone, not UTC
    store
        .seed_event(event_at(
            "today-late",
            "Night Show",
            Utc.with_ymd_and_hms(2025, 6, 2, 3, 30, 0).unwrap(),
        ))
        .await;
    // Tomorrow 9 AM New York
    store
        .seed_event(event_at(
            "tomorrow-morning",
            "Retro",
            Utc.with_ymd_and_hms(2025, 6, 2, 13, 0, 0).unwrap(),
        ))
        .await;
    // Next week: in neither partition
    store
        .seed_event(event_at(
            "next-week",
            "Offsite",
            Utc.with_ymd_and_hms(2025, 6, 8, 13, 0, 0).unwrap(),
        ))
        .await;
    // Inactive events never reach a digest
    let mut inactive = event_at(
        "inactive",
        "Cancelled Gala",
        Utc.with_ymd_and_hms(2025, 6, 1, 23, 0, 0).unwrap(),
    );
    inactive.is_active = false;
    store.seed_event(inactive).await;
    // Malformed event is skipped, not fatal
    let mut no_date = event_at("no-date", "Mystery", now);
    no_date.scheduled_at = None;
    store.seed_event(no_date).await;

    scheduler.run_digest().await.unwrap();

    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 2);

    let today = sent
        .iter()
        .find(|(_, m)| m.title == "Happening Today")
        .expect("today digest");
    // Listed in time order: evening show before the late-night one
    assert_eq!(today.1.body, "• Launch\n• Night Show");
    assert_eq!(today.1.data.get("count"), Some(&"2".to_string()));

    let tomorrow = sent
        .iter()
        .find(|(_, m)| m.title == "Coming Up Tomorrow")
        .expect("tomorrow digest");
    assert_eq!(tomorrow.1.body, "• Retro");
    assert_eq!(tomorrow.1.data.get("day"), Some(&"tomorrow".to_string()));
}

#[tokio::test]
async fn empty_partitions_produce_no_messages() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 16, 0, 0).unwrap();
    let (store, notifier, scheduler) = fixture(now);

    // Only a far-future event
    store
        .seed_event(event_at(
            "next-week",
            "Offsite",
            Utc.with_ymd_and_hms(2025, 6, 8, 13, 0, 0).unwrap(),
        ))
        .await;

    scheduler.run_digest().await.unwrap();

    assert_eq!(notifier.sent_count().await, 0);
}

#[tokio::test]
async fn digest_runs_are_idempotent_by_construction() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 16, 0, 0).unwrap();
    let (store, notifier, scheduler) = fixture(now);
    store
        .seed_event(event_at(
            "today",
            "Launch",
            Utc.with_ymd_and_hms(2025, 6, 1, 22, 0, 0).unwrap(),
        ))
        .await;

    scheduler.run_digest().await.unwrap();
    scheduler.run_digest().await.unwrap();

    // Each trigger recomputes from the store; two runs mean two digests,
    // with no dedup state involved
    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(_, m)| m.title == "Happening Today"));
}
