// Audited dispatch
//
// Single send path shared by the listener, the reminder scheduler, and the
// manual trigger. Every successful send is appended to the send log; every
// transport failure is appended to the error log with the original
// title/body before the error is handed back, so failures stay auditable
// even when the caller drops the result.

use std::sync::Arc;

use herald_core::{Clock, DocumentStore, ErrorLogEntry, Notifier, PushMessage, SendLogEntry};
use tracing::{error, warn};

/// Sends push messages and records the outcome in the audit logs.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// Broadcast to a topic, logging the outcome.
    pub async fn broadcast(
        &self,
        topic: &str,
        event_id: Option<&str>,
        message: &PushMessage,
    ) -> herald_core::Result<String> {
        let result = self.notifier.send_to_topic(topic, message).await;
        self.audit(topic, event_id, message, result).await
    }

    /// Send to a single device token, logging the outcome.
    pub async fn send_to_token(
        &self,
        token: &str,
        event_id: Option<&str>,
        message: &PushMessage,
    ) -> herald_core::Result<String> {
        let result = self.notifier.send_to_token(token, message).await;
        self.audit(token, event_id, message, result).await
    }

    async fn audit(
        &self,
        target: &str,
        event_id: Option<&str>,
        message: &PushMessage,
        result: herald_core::Result<String>,
    ) -> herald_core::Result<String> {
        match result {
            Ok(message_id) => {
                let entry = SendLogEntry::new(
                    event_id.map(String::from),
                    message.title.as_str(),
                    message.body.as_str(),
                    target,
                    message_id.as_str(),
                    self.clock.now(),
                );
                if let Err(log_err) = self.store.append_send_log(&entry).await {
                    // The notification went out; a lost audit row is not
                    // worth failing the change over
                    warn!(error = %log_err, "Failed to append send log entry");
                }
                Ok(message_id)
            }
            Err(send_err) => {
                let entry = ErrorLogEntry::new(
                    event_id.map(String::from),
                    message.title.as_str(),
                    message.body.as_str(),
                    send_err.to_string(),
                    self.clock.now(),
                );
                if let Err(log_err) = self.store.append_error_log(&entry).await {
                    warn!(error = %log_err, "Failed to append error log entry");
                }
                error!(target = %target, error = %send_err, "Dispatch failed");
                Err(send_err)
            }
        }
    }
}
