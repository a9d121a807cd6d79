// Example: Herald against in-memory collaborators
// Run with: cargo run --example local_demo
//
// This example demonstrates:
// - Starting the listener and absorbing the baseline snapshot
// - A live add producing exactly one new-event notification
// - A date change producing a reschedule notification
// - A duplicate add being suppressed by the notification record

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use herald_core::memory::{CollectingNotifier, InMemoryDocumentStore};
use herald_core::{ChangeRecord, Event, SystemClock, TimestampValue};
use herald_worker::{HeraldConfig, HeraldService};

fn event(id: &str, title: &str, hours_from_now: i64) -> Event {
    Event {
        id: id.to_string(),
        title: Some(title.to_string()),
        scheduled_at: Some(TimestampValue::DateTime(
            Utc::now() + ChronoDuration::hours(hours_from_now),
        )),
        is_active: true,
        location: Some("Main Hall".to_string()),
        image_url: None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("herald_worker=info,herald_core=info")
        .init();

    let store = Arc::new(InMemoryDocumentStore::new());
    let notifier = Arc::new(CollectingNotifier::new());
    let service = HeraldService::new(
        store.clone(),
        notifier.clone(),
        Arc::new(SystemClock),
        HeraldConfig::default(),
    );

    service.start_listening().await;
    while store.subscriber_count().await == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Baseline: replayed documents are cached, never notified
    store
        .push_batch(vec![ChangeRecord::added(event("e1", "Launch Party", 26))])
        .await;

    // Live changes
    store
        .push_batch(vec![ChangeRecord::added(event("e2", "Team Retro", 30))])
        .await;
    store
        .push_batch(vec![ChangeRecord::modified(event("e1", "Launch Party", 28))])
        .await;
    store
        .push_batch(vec![ChangeRecord::added(event("e2", "Team Retro", 30))])
        .await;

    while notifier.sent_count().await < 2 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\nDispatched notifications:");
    for (target, message) in notifier.sent().await {
        println!("  [{}] {} -- {}", target, message.title, message.body);
    }

    let stats = service.get_stats().await?;
    println!(
        "\nStats: {} sends, {} errors",
        stats.recent_sends.len(),
        stats.recent_errors.len()
    );

    service.shutdown().await;
    Ok(())
}
