// Herald service crate
//
// Wires the core abstractions into a running service: the reconciliation
// engine over a live change subscription, the daily reminder scheduler, and
// the facade operations callers use (manual notify, stats, lifecycle).

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod reminders;
pub mod service;

pub use config::HeraldConfig;
pub use dispatch::Dispatcher;
pub use engine::{Phase, ReconciliationEngine, RESUBSCRIBE_DELAY};
pub use reminders::ReminderScheduler;
pub use service::{HeraldService, ServiceStats};
