// Change-feed reconciliation engine
//
// This engine:
// 1. Opens a live change subscription and processes batches sequentially
// 2. Suppresses the baseline replay delivered after every (re)subscribe
// 3. Classifies each live change and dispatches at most one notification
//    per distinct notifiable change, backed by the durable record store
// 4. Resubscribes after stream failure on a fixed delay, indefinitely
//
// Changes within a batch are processed one at a time in arrival order; the
// cache and record store need a linearized view per event id, so there is
// no fan-out.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use herald_core::{
    classify_added, classify_modified, validate, AddedAction, ChangeBatch, ChangeKind,
    ChangeRecord, Clock, DocumentStore, EventCache, ModifiedAction, NotificationComposer,
    NotificationKind, NotificationRecord, Result, ValidEvent,
};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::dispatch::Dispatcher;

/// Fixed delay between a stream failure and the next subscribe attempt.
pub const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

/// Subscription lifecycle phase.
///
/// The store replays every existing matching document as an `added` change
/// in the first batch after subscribing; `AwaitingFirstBatch` absorbs that
/// replay into the cache without dispatching anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingFirstBatch,
    Live,
}

/// Drives the change subscription and decides which changes get notified.
///
/// Owns the event cache outright (single writer). The durable record store
/// is the authority on what has been notified; the cache only accelerates
/// the previous-instant lookup and loses any disagreement.
pub struct ReconciliationEngine {
    store: Arc<dyn DocumentStore>,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    composer: NotificationComposer,
    topic: String,
    cache: EventCache,
    phase: Phase,
}

impl ReconciliationEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        dispatcher: Dispatcher,
        clock: Arc<dyn Clock>,
        composer: NotificationComposer,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clock,
            composer,
            topic: topic.into(),
            cache: EventCache::new(),
            phase: Phase::AwaitingFirstBatch,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cache(&self) -> &EventCache {
        &self.cache
    }

    /// Run the subscription lifecycle until shutdown.
    ///
    /// Stream-level failures trigger resubscription after a fixed delay,
    /// indefinitely. Shutdown is observed between batches, so in-flight
    /// change processing completes before the task stops.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            self.phase = Phase::AwaitingFirstBatch;
            let mut stream = match self.store.subscribe().await {
                Ok(stream) => {
                    info!(topic = %self.topic, "Change subscription opened");
                    stream
                }
                Err(e) => {
                    error!(error = %e, "Failed to open change subscription");
                    if self.wait_before_resubscribe(&mut shutdown).await {
                        return;
                    }
                    continue;
                }
            };

            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        info!("Shutdown signal received, stopping listener");
                        return;
                    }
                    item = stream.next() => match item {
                        Some(Ok(batch)) => self.handle_batch(batch).await,
                        Some(Err(e)) => {
                            error!(error = %e, "Change stream failed");
                            break;
                        }
                        None => {
                            warn!("Change stream ended unexpectedly");
                            break;
                        }
                    }
                }
            }

            if self.wait_before_resubscribe(&mut shutdown).await {
                return;
            }
        }
    }

    /// Returns true when shutdown arrived during the delay.
    async fn wait_before_resubscribe(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("Shutdown signal received, stopping listener");
                true
            }
            _ = self.clock.sleep(RESUBSCRIBE_DELAY) => false,
        }
    }

    /// Process one delivered batch according to the current phase.
    pub async fn handle_batch(&mut self, batch: ChangeBatch) {
        if self.phase == Phase::AwaitingFirstBatch {
            // Empty batches do not count as the baseline snapshot
            if batch.is_empty() {
                return;
            }
            self.absorb_baseline(&batch);
            self.phase = Phase::Live;
            return;
        }

        for change in &batch {
            if let Err(e) = self.process_change(change).await {
                // A failing change is isolated; the rest of the batch and
                // the subscription keep going
                error!(event_id = %change.event.id, error = %e, "Failed to process change, skipping");
            }
        }
    }

    /// Treat the first batch after (re)subscribe as pre-existing state:
    /// populate the cache, dispatch nothing.
    fn absorb_baseline(&mut self, batch: &ChangeBatch) {
        let mut cached = 0usize;
        for change in batch {
            if let Some(instant) = change.event.scheduled_instant() {
                self.cache.upsert(change.event.id.as_str(), instant);
                cached += 1;
            }
        }
        info!(
            changes = batch.len(),
            cached = cached,
            "Baseline snapshot absorbed without dispatch"
        );
    }

    async fn process_change(&mut self, change: &ChangeRecord) -> Result<()> {
        if change.kind == ChangeKind::Removed {
            self.cache.remove(&change.event.id);
            debug!(event_id = %change.event.id, "Event removed, cache entry cleared");
            return Ok(());
        }

        let valid = match validate(&change.event, self.clock.now()) {
            Ok(valid) => valid,
            Err(reason) => {
                debug!(event_id = %change.event.id, reason = ?reason, "Change skipped");
                return Ok(());
            }
        };

        match change.kind {
            ChangeKind::Added => self.process_added(&valid).await,
            _ => self.process_modified(&valid).await,
        }
    }

    async fn process_added(&mut self, event: &ValidEvent<'_>) -> Result<()> {
        let record = self.store.notification_record(event.id).await?;
        match classify_added(record.map(|r| r.last_notified_date)) {
            AddedAction::AlreadyNotified(last_notified) => {
                // Keep the cache consistent with the store even when
                // skipping, so a later modify compares against the truth
                self.cache.upsert(event.id, last_notified);
                debug!(event_id = %event.id, "Record exists, already notified");
            }
            AddedAction::New => self.notify_new(event).await?,
        }
        Ok(())
    }

    async fn process_modified(&mut self, event: &ValidEvent<'_>) -> Result<()> {
        // Three-tier previous-instant lookup: cache first, then the durable
        // record, each tier consulted only when the previous one is empty
        let previous = match self.cache.get(event.id) {
            Some(instant) => Some(instant),
            None => self
                .store
                .notification_record(event.id)
                .await?
                .map(|record| record.last_notified_date),
        };

        match classify_modified(previous, event.scheduled_at) {
            ModifiedAction::NotifyAsNew => {
                warn!(
                    event_id = %event.id,
                    "No prior instant in cache or store on modify, notifying as new"
                );
                self.notify_new(event).await
            }
            ModifiedAction::Rescheduled { previous } => {
                self.notify_rescheduled(event, previous).await
            }
            ModifiedAction::Unchanged => {
                // Idempotent refresh: no send, but the cache entry is
                // re-written so a cold-started cache converges
                self.cache.upsert(event.id, event.scheduled_at);
                debug!(event_id = %event.id, "Scheduled date unchanged, cache refreshed");
                Ok(())
            }
        }
    }

    async fn notify_new(&mut self, event: &ValidEvent<'_>) -> Result<()> {
        let message = self.composer.new_event(event);
        self.dispatcher
            .broadcast(&self.topic, Some(event.id), &message)
            .await?;

        let record = NotificationRecord::new(
            event.id,
            event.title,
            NotificationKind::NewEvent,
            event.scheduled_at,
            self.clock.now(),
        );
        self.store.put_notification_record(&record, false).await?;
        self.cache.upsert(event.id, event.scheduled_at);
        info!(event_id = %event.id, title = %event.title, "New event notification sent");
        Ok(())
    }

    async fn notify_rescheduled(
        &mut self,
        event: &ValidEvent<'_>,
        previous: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        let message = self.composer.rescheduled(event, previous);
        self.dispatcher
            .broadcast(&self.topic, Some(event.id), &message)
            .await?;

        let record = NotificationRecord::new(
            event.id,
            event.title,
            NotificationKind::DateModified,
            event.scheduled_at,
            self.clock.now(),
        );
        // Merge so fields beyond this struct survive on backends that
        // carry them
        self.store.put_notification_record(&record, true).await?;
        self.cache.upsert(event.id, event.scheduled_at);
        info!(
            event_id = %event.id,
            previous = %previous,
            current = %event.scheduled_at,
            "Reschedule notification sent"
        );
        Ok(())
    }
}
