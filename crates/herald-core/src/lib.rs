// Change-Feed Reconciliation Abstractions
//
// This crate provides the store-agnostic core of Herald: watch a changing
// collection of event documents and decide, per change, whether a push
// notification is owed, with at-most-once semantics backed by a durable
// record collection.
//
// Key design decisions:
// - Uses traits (DocumentStore, Notifier, Clock) for pluggable backends
// - Classification is pure; the engine performs lookups and passes results in
// - One canonical instant type: heterogeneous store timestamps normalize at
//   the edge via TimestampValue and are never compared raw
// - The event cache is a plain single-writer map owned by the engine; the
//   durable record store wins every disagreement
// - In-memory collaborator implementations live here for examples and tests

pub mod cache;
pub mod classify;
pub mod compose;
pub mod error;
pub mod event;
pub mod logs;
pub mod message;
pub mod record;
pub mod time;
pub mod traits;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use cache::EventCache;
pub use classify::{
    classify_added, classify_modified, validate, validate_structure, AddedAction, ModifiedAction,
    SkipReason, ValidEvent,
};
pub use compose::{DigestDay, NotificationComposer};
pub use error::{HeraldError, Result};
pub use event::{ChangeBatch, ChangeKind, ChangeRecord, Event};
pub use logs::{ErrorLogEntry, SendLogEntry};
pub use message::PushMessage;
pub use record::{NotificationKind, NotificationRecord};
pub use time::TimestampValue;
pub use traits::{ChangeStream, Clock, DocumentStore, Notifier, SystemClock};
