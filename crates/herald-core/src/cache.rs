// Process-local event cache
//
// First-tier lookup for the previous scheduled instant. Owned and mutated by
// the reconciliation engine alone (single writer), so a plain map is enough;
// Rust ownership serializes access. The cache is always secondary to the
// durable record store and must lose any disagreement with it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Volatile map from event id to last-known scheduled instant.
///
/// Created empty at process start and rebuilt from the baseline batch after
/// every (re)subscribe; never the authority on what has been notified.
#[derive(Debug, Default)]
pub struct EventCache {
    entries: HashMap<String, DateTime<Utc>>,
}

impl EventCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, event_id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(event_id).copied()
    }

    pub fn upsert(&mut self, event_id: impl Into<String>, instant: DateTime<Utc>) {
        self.entries.insert(event_id.into(), instant);
    }

    pub fn remove(&mut self, event_id: &str) -> Option<DateTime<Utc>> {
        self.entries.remove(event_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_upsert_and_get() {
        let mut cache = EventCache::new();
        let instant = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();

        cache.upsert("evt-1", instant);
        assert_eq!(cache.get("evt-1"), Some(instant));
        assert_eq!(cache.get("evt-2"), None);
    }

    #[test]
    fn test_upsert_overwrites() {
        let mut cache = EventCache::new();
        let first = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap();

        cache.upsert("evt-1", first);
        cache.upsert("evt-1", second);

        assert_eq!(cache.get("evt-1"), Some(second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_clears_entry() {
        let mut cache = EventCache::new();
        let instant = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();

        cache.upsert("evt-1", instant);
        assert_eq!(cache.remove("evt-1"), Some(instant));
        assert_eq!(cache.get("evt-1"), None);
        assert!(cache.is_empty());
    }
}
