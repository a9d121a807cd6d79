// Service facade
//
// Owns the long-lived tasks (listener, reminder scheduler) and exposes the
// operations callers outside the core use: start_listening,
// schedule_reminders, notify_event, get_stats, shutdown. Start methods are
// idempotent; calling them while the task is alive is a no-op.

use std::sync::Arc;

use herald_core::{
    validate_structure, Clock, DocumentStore, ErrorLogEntry, HeraldError, NotificationComposer,
    NotificationKind, NotificationRecord, Notifier, Result, SendLogEntry,
};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::HeraldConfig;
use crate::dispatch::Dispatcher;
use crate::engine::ReconciliationEngine;
use crate::reminders::ReminderScheduler;

/// How many entries of each log collection get_stats returns.
const STATS_LIMIT: usize = 25;

/// Recent-send and recent-error summaries, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub recent_sends: Vec<SendLogEntry>,
    pub recent_errors: Vec<ErrorLogEntry>,
}

/// The Herald service: listener lifecycle, reminders, manual operations.
pub struct HeraldService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    config: HeraldConfig,
    composer: NotificationComposer,
    dispatcher: Dispatcher,
    shutdown_tx: watch::Sender<bool>,
    listener: Mutex<Option<JoinHandle<()>>>,
    reminder: Mutex<Option<JoinHandle<()>>>,
}

impl HeraldService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: HeraldConfig,
    ) -> Self {
        let composer = NotificationComposer::new(config.timezone());
        let dispatcher = Dispatcher::new(store.clone(), notifier, clock.clone());
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            store,
            clock,
            config,
            composer,
            dispatcher,
            shutdown_tx,
            listener: Mutex::new(None),
            reminder: Mutex::new(None),
        }
    }

    /// Begin the subscription lifecycle. Idempotent.
    pub async fn start_listening(&self) {
        let mut guard = self.listener.lock().await;
        if guard.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Listener already running");
            return;
        }

        let mut engine = ReconciliationEngine::new(
            self.store.clone(),
            self.dispatcher.clone(),
            self.clock.clone(),
            self.composer.clone(),
            self.config.topic(),
        );
        let shutdown = self.shutdown_tx.subscribe();
        *guard = Some(tokio::spawn(async move {
            engine.run(shutdown).await;
        }));
        info!("Listener started");
    }

    /// Register the daily reminder trigger. Idempotent.
    pub async fn schedule_reminders(&self) {
        let mut guard = self.reminder.lock().await;
        if guard.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Reminder scheduler already running");
            return;
        }

        let scheduler = ReminderScheduler::new(
            self.store.clone(),
            self.dispatcher.clone(),
            self.clock.clone(),
            self.composer.clone(),
            self.config.timezone(),
            self.config.topic(),
            self.config.reminder_hour(),
        );
        let shutdown = self.shutdown_tx.subscribe();
        *guard = Some(tokio::spawn(async move {
            scheduler.run(shutdown).await;
        }));
        info!("Reminder scheduler started");
    }

    /// Manual trigger: force a new-event notification for an event,
    /// regardless of prior notification state.
    ///
    /// Unlike the passive listener path, failures here surface to the
    /// caller (after being persisted to the error log).
    pub async fn notify_event(&self, event_id: &str) -> Result<String> {
        let event = self
            .store
            .event(event_id)
            .await?
            .ok_or_else(|| HeraldError::not_found(event_id))?;

        // Only structural validation applies on the forced path; record,
        // activity, and past checks are bypassed
        let valid = validate_structure(&event).map_err(|reason| {
            HeraldError::validation(format!(
                "event {} cannot be composed: {:?}",
                event_id, reason
            ))
        })?;

        let message = self.composer.new_event(&valid);
        let message_id = self
            .dispatcher
            .broadcast(&self.config.topic(), Some(event_id), &message)
            .await?;

        let record = NotificationRecord::new(
            valid.id,
            valid.title,
            NotificationKind::NewEvent,
            valid.scheduled_at,
            self.clock.now(),
        );
        self.store.put_notification_record(&record, false).await?;
        info!(event_id = %event_id, message_id = %message_id, "Manual notification sent");
        Ok(message_id)
    }

    /// Recent send/error summaries from the audit log collections.
    pub async fn get_stats(&self) -> Result<ServiceStats> {
        let recent_sends = self.store.recent_send_logs(STATS_LIMIT).await?;
        let recent_errors = self.store.recent_error_logs(STATS_LIMIT).await?;
        Ok(ServiceStats {
            recent_sends,
            recent_errors,
        })
    }

    /// Signal both tasks to stop and wait for them to drain.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.listener.lock().await.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.reminder.lock().await.take() {
            let _ = handle.await;
        }
        info!("Service stopped");
    }
}
