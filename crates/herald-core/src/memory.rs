// In-memory implementations for examples and testing
//
// These implementations keep all data in memory, making them perfect for:
// - Standalone examples that don't need external services
// - Unit and integration tests
// - Driving the engine deterministically (pushed batches, injected failures)

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::{HeraldError, Result};
use crate::event::{ChangeBatch, Event};
use crate::logs::{ErrorLogEntry, SendLogEntry};
use crate::message::PushMessage;
use crate::record::NotificationRecord;
use crate::traits::{ChangeStream, Clock, DocumentStore, Notifier};

// ============================================================================
// InMemoryDocumentStore - events, records, and logs in maps
// ============================================================================

type BatchSender = mpsc::UnboundedSender<Result<ChangeBatch>>;

/// In-memory document store.
///
/// Batches pushed with [`push_batch`](Self::push_batch) are delivered to
/// every open subscription; [`fail_streams`](Self::fail_streams) injects a
/// stream-level error, and subscribers are expected to resubscribe.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    events: Arc<RwLock<HashMap<String, Event>>>,
    records: Arc<RwLock<HashMap<String, NotificationRecord>>>,
    send_logs: Arc<RwLock<Vec<SendLogEntry>>>,
    error_logs: Arc<RwLock<Vec<ErrorLogEntry>>>,
    subscribers: Arc<RwLock<Vec<BatchSender>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the event collection (useful for testing)
    pub async fn seed_event(&self, event: Event) {
        self.events.write().await.insert(event.id.clone(), event);
    }

    /// Pre-populate a notification record (simulates prior-run state)
    pub async fn seed_record(&self, record: NotificationRecord) {
        self.records
            .write()
            .await
            .insert(record.event_id.clone(), record);
    }

    /// Deliver a change batch to every open subscription
    pub async fn push_batch(&self, batch: ChangeBatch) {
        let subscribers = self.subscribers.read().await;
        for sender in subscribers.iter() {
            let _ = sender.send(Ok(batch.clone()));
        }
    }

    /// Inject a stream-level failure into every open subscription and drop
    /// them, forcing resubscription
    pub async fn fail_streams(&self, message: &str) {
        let mut subscribers = self.subscribers.write().await;
        for sender in subscribers.iter() {
            let _ = sender.send(Err(HeraldError::stream(message)));
        }
        subscribers.clear();
    }

    /// Number of currently open subscriptions
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Stored notification record, bypassing the trait (test inspection)
    pub async fn record(&self, event_id: &str) -> Option<NotificationRecord> {
        self.records.read().await.get(event_id).cloned()
    }

    /// Clear all collections
    pub async fn clear(&self) {
        self.events.write().await.clear();
        self.records.write().await.clear();
        self.send_logs.write().await.clear();
        self.error_logs.write().await.clear();
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn active_events(&self) -> Result<Vec<Event>> {
        Ok(self
            .events
            .read()
            .await
            .values()
            .filter(|event| event.is_active)
            .cloned()
            .collect())
    }

    async fn event(&self, event_id: &str) -> Result<Option<Event>> {
        Ok(self.events.read().await.get(event_id).cloned())
    }

    async fn subscribe(&self) -> Result<ChangeStream> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.write().await.push(sender);
        Ok(Box::pin(UnboundedReceiverStream::new(receiver)))
    }

    async fn notification_record(&self, event_id: &str) -> Result<Option<NotificationRecord>> {
        Ok(self.records.read().await.get(event_id).cloned())
    }

    async fn put_notification_record(
        &self,
        record: &NotificationRecord,
        _merge: bool,
    ) -> Result<()> {
        // A map of typed records has no extra fields to preserve, so merge
        // and replace coincide here
        self.records
            .write()
            .await
            .insert(record.event_id.clone(), record.clone());
        Ok(())
    }

    async fn append_send_log(&self, entry: &SendLogEntry) -> Result<()> {
        self.send_logs.write().await.push(entry.clone());
        Ok(())
    }

    async fn append_error_log(&self, entry: &ErrorLogEntry) -> Result<()> {
        self.error_logs.write().await.push(entry.clone());
        Ok(())
    }

    async fn recent_send_logs(&self, limit: usize) -> Result<Vec<SendLogEntry>> {
        Ok(self
            .send_logs
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn recent_error_logs(&self, limit: usize) -> Result<Vec<ErrorLogEntry>> {
        Ok(self
            .error_logs
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

// ============================================================================
// CollectingNotifier - records sends instead of delivering them
// ============================================================================

/// Notifier that collects every message it is handed.
///
/// With `set_failing(true)` every send returns a dispatch error, for
/// exercising the audit-and-propagate path.
#[derive(Default)]
pub struct CollectingNotifier {
    sent: Arc<RwLock<Vec<(String, PushMessage)>>>,
    failing: Arc<AtomicBool>,
    counter: AtomicU64,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All sends so far, as (target, message) pairs
    pub async fn sent(&self) -> Vec<(String, PushMessage)> {
        self.sent.read().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.read().await.len()
    }

    pub async fn clear(&self) {
        self.sent.write().await.clear();
    }

    /// Make every subsequent send fail with a dispatch error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    async fn record(&self, target: &str, message: &PushMessage) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HeraldError::dispatch("transport unavailable"));
        }
        self.sent
            .write()
            .await
            .push((target.to_string(), message.clone()));
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("mem-{}", id))
    }
}

#[async_trait]
impl Notifier for CollectingNotifier {
    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> Result<String> {
        self.record(topic, message).await
    }

    async fn send_to_token(&self, token: &str, message: &PushMessage) -> Result<String> {
        self.record(token, message).await
    }
}

// ============================================================================
// ManualClock - settable time, instant sleeps
// ============================================================================

/// Clock whose time only moves when a test moves it. Sleeps return
/// immediately and are recorded for assertion.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<std::sync::RwLock<DateTime<Utc>>>,
    sleeps: Arc<std::sync::RwLock<Vec<Duration>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(std::sync::RwLock::new(now)),
            sleeps: Arc::new(std::sync::RwLock::new(Vec::new())),
        }
    }

    pub fn set_now(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap() = now;
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.write().unwrap();
        *now += chrono::Duration::from_std(duration).expect("duration out of range");
    }

    /// Durations passed to `sleep` so far
    pub fn recorded_sleeps(&self) -> Vec<Duration> {
        self.sleeps.read().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.write().unwrap().push(duration);
        // Collapse to a single short timer tick: paced loops keep making
        // progress without real waits, and a paused runtime can still
        // auto-advance because the task parks on the timer instead of
        // spinning
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
