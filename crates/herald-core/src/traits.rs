// Collaborator traits
//
// These traits keep the reconciliation engine independent of concrete
// backends:
// - In-memory implementations for examples and testing (memory module)
// - A hosted document store and push transport in production
// - A manual clock for deterministic lifecycle tests

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::error::Result;
use crate::event::{ChangeBatch, Event};
use crate::logs::{ErrorLogEntry, SendLogEntry};
use crate::message::PushMessage;
use crate::record::NotificationRecord;

// ============================================================================
// DocumentStore - events, notification records, audit logs
// ============================================================================

/// Live change subscription: an ordered sequence of batches, delivered as
/// the underlying data changes. An `Err` item is a stream-level failure;
/// dropping the stream cancels the subscription.
pub type ChangeStream = Pin<Box<dyn Stream<Item = Result<ChangeBatch>> + Send>>;

/// Trait for the document store backing events, notification records, and
/// the audit log collections.
///
/// Implementations can:
/// - Keep everything in memory for testing
/// - Talk to a hosted document database in production
///
/// All methods must be safe under concurrent invocation from the listener
/// and the reminder scheduler.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All events currently flagged active
    async fn active_events(&self) -> Result<Vec<Event>>;

    /// A single event by id
    async fn event(&self, event_id: &str) -> Result<Option<Event>>;

    /// Open a live change subscription over the event collection.
    ///
    /// The store replays every existing matching document as an `added`
    /// change in the first batch after subscribing; the engine suppresses
    /// that baseline.
    async fn subscribe(&self) -> Result<ChangeStream>;

    /// The notification record for an event, if one exists
    async fn notification_record(&self, event_id: &str) -> Result<Option<NotificationRecord>>;

    /// Write a notification record, keyed by its event id. With `merge`,
    /// fields outside the record struct that a backend may carry are
    /// preserved; without it the document is replaced.
    async fn put_notification_record(&self, record: &NotificationRecord, merge: bool)
        -> Result<()>;

    /// Append to the send audit log
    async fn append_send_log(&self, entry: &SendLogEntry) -> Result<()>;

    /// Append to the error audit log
    async fn append_error_log(&self, entry: &ErrorLogEntry) -> Result<()>;

    /// Most recent send log entries, newest first
    async fn recent_send_logs(&self, limit: usize) -> Result<Vec<SendLogEntry>>;

    /// Most recent error log entries, newest first
    async fn recent_error_logs(&self, limit: usize) -> Result<Vec<ErrorLogEntry>>;
}

// ============================================================================
// Notifier - push delivery transport
// ============================================================================

/// Trait for the push transport.
///
/// Delivery to the end device is best-effort; the returned message id only
/// acknowledges handoff to the transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Broadcast to all subscribers of a topic; returns the transport
    /// message id
    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> Result<String>;

    /// Send to a single device token; returns the transport message id
    async fn send_to_token(&self, token: &str, message: &PushMessage) -> Result<String>;
}

// ============================================================================
// Clock - injected time source
// ============================================================================

/// Trait for reading the current time and sleeping.
///
/// The engine's resubscribe delay and the scheduler's day boundaries go
/// through this seam so tests never wait on real time.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

/// System clock backed by `Utc::now` and the tokio timer.
#[derive(Debug, Default, Clone)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
