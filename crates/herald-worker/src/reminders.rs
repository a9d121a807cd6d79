// Daily reminder digests
//
// On a daily trigger, scans all active events and sends one aggregate digest
// per non-empty day partition (today / tomorrow), bucketed by calendar day
// in the deployment timezone. Idempotent by construction: each run
// recomputes from the store, so there is no dedup state to maintain and the
// event cache is never touched.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use herald_core::{Clock, DigestDay, DocumentStore, NotificationComposer, Result};
use tokio::sync::watch;
use tracing::{error, info};

use crate::dispatch::Dispatcher;

/// Sends the daily today/tomorrow digests.
pub struct ReminderScheduler {
    store: Arc<dyn DocumentStore>,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    composer: NotificationComposer,
    timezone: Tz,
    topic: String,
    trigger_hour: u32,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        dispatcher: Dispatcher,
        clock: Arc<dyn Clock>,
        composer: NotificationComposer,
        timezone: Tz,
        topic: impl Into<String>,
        trigger_hour: u32,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clock,
            composer,
            timezone,
            topic: topic.into(),
            trigger_hour,
        }
    }

    /// Run the daily trigger loop until shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(hour = self.trigger_hour, timezone = %self.timezone, "Reminder scheduler started");
        loop {
            let wait = self.until_next_trigger();
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Shutdown signal received, stopping reminder scheduler");
                    return;
                }
                _ = self.clock.sleep(wait) => {}
            }
            if let Err(e) = self.run_digest().await {
                error!(error = %e, "Daily digest run failed");
            }
        }
    }

    /// One digest pass: partition active events into today/tomorrow and
    /// dispatch a digest per non-empty partition.
    pub async fn run_digest(&self) -> Result<()> {
        let local_now = self.clock.now().with_timezone(&self.timezone);
        let today = local_now.date_naive();
        let Some(tomorrow) = today.checked_add_days(Days::new(1)) else {
            return Ok(());
        };

        let events = self.store.active_events().await?;
        // (instant, title) pairs so each digest lists events in time order
        let mut today_events: Vec<(DateTime<Utc>, String)> = Vec::new();
        let mut tomorrow_events: Vec<(DateTime<Utc>, String)> = Vec::new();
        for event in &events {
            let (Some(title), Some(instant)) = (event.title.as_deref(), event.scheduled_instant())
            else {
                continue;
            };
            // Time of day is discarded; only the calendar day in the
            // deployment zone decides the partition
            let event_date = instant.with_timezone(&self.timezone).date_naive();
            if event_date == today {
                today_events.push((instant, title.to_string()));
            } else if event_date == tomorrow {
                tomorrow_events.push((instant, title.to_string()));
            }
        }

        let sent_today = self.send_partition(DigestDay::Today, today_events).await?;
        let sent_tomorrow = self
            .send_partition(DigestDay::Tomorrow, tomorrow_events)
            .await?;
        info!(
            today = sent_today,
            tomorrow = sent_tomorrow,
            "Daily digest run complete"
        );
        Ok(())
    }

    /// Returns the number of titles included (0 means no message sent).
    async fn send_partition(
        &self,
        day: DigestDay,
        mut events: Vec<(DateTime<Utc>, String)>,
    ) -> Result<usize> {
        if events.is_empty() {
            return Ok(0);
        }
        events.sort();
        let titles: Vec<String> = events.into_iter().map(|(_, title)| title).collect();
        let message = self.composer.digest(day, &titles);
        self.dispatcher.broadcast(&self.topic, None, &message).await?;
        Ok(titles.len())
    }

    fn trigger_at(&self, date: NaiveDate) -> Option<chrono::DateTime<Tz>> {
        date.and_hms_opt(self.trigger_hour, 0, 0)
            .and_then(|naive| naive.and_local_timezone(self.timezone).earliest())
    }

    /// Time until the next daily trigger in the deployment zone.
    fn until_next_trigger(&self) -> Duration {
        let now_utc = self.clock.now();
        let local_now = now_utc.with_timezone(&self.timezone);
        let today = local_now.date_naive();

        let next = self
            .trigger_at(today)
            .filter(|trigger| *trigger > local_now)
            .or_else(|| {
                today
                    .checked_add_days(Days::new(1))
                    .and_then(|tomorrow| self.trigger_at(tomorrow))
            });

        match next {
            Some(trigger) => (trigger.with_timezone(&Utc) - now_utc)
                .to_std()
                .unwrap_or(Duration::from_secs(3600)),
            // Unrepresentable trigger (calendar edge); try again in an hour
            None => Duration::from_secs(3600),
        }
    }
}
