use std::sync::Arc;

use anyhow::Result;
use herald_core::memory::{CollectingNotifier, InMemoryDocumentStore};
use herald_core::{DocumentStore, Notifier, SystemClock};
use herald_fcm::FcmNotifier;
use herald_worker::{HeraldConfig, HeraldService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald_worker=debug,herald_core=debug,herald_fcm=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("herald-worker starting...");

    let config = HeraldConfig::from_env();
    tracing::info!(
        topic = %config.topic(),
        timezone = %config.timezone(),
        reminder_hour = config.reminder_hour(),
        "Configuration loaded"
    );

    // The document store is a pluggable collaborator; the in-memory backend
    // serves local runs until a hosted store client is wired in
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    tracing::warn!("No document store backend configured, using the in-memory store");

    let notifier: Arc<dyn Notifier> = match FcmNotifier::from_env() {
        Ok(fcm) => {
            tracing::info!("FCM transport configured");
            Arc::new(fcm)
        }
        Err(_) => {
            tracing::warn!("FCM_SERVER_KEY not set, sends will be collected in memory");
            Arc::new(CollectingNotifier::new())
        }
    };

    let service = HeraldService::new(store, notifier, Arc::new(SystemClock), config);
    service.start_listening().await;
    service.schedule_reminders().await;

    tracing::info!("Service ready, waiting for shutdown signal...");
    tokio::signal::ctrl_c().await?;

    service.shutdown().await;
    tracing::info!("Worker shutdown complete");
    Ok(())
}
