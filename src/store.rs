use crate::events::{EntityKey, EventRecord};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

// ============================================================
// Data Structures
// ============================================================

/// In-memory cache of in-flight pipelines and jobs
///
/// Same-key writes serialize on the owning shard's lock, so the last write in
/// receipt order wins. `sweep` decides and removes under that same lock, which
/// means a refresh that lands first is always observed by the sweep.
pub struct EventStore {
    // Entry mapping (DashMap for low lock contention)
    entries: DashMap<EntityKey, CacheEntry>,

    // Lifetime of an entry without a refreshing event
    ttl: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub expire_at: DateTime<Utc>,
    pub payload: EventRecord,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_at <= now
    }
}

// ============================================================
// EventStore Core Logic
// ============================================================

impl EventStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Insert or replace the entry for `key`, expiring at `now + ttl`
    pub fn upsert(&self, key: EntityKey, payload: EventRecord, now: DateTime<Utc>) {
        let expire_at = now + self.ttl;
        let previous = self.entries.insert(key, CacheEntry { expire_at, payload });

        tracing::debug!(
            key = %key,
            refreshed = previous.is_some(),
            expire_at = %expire_at,
            "Entry upserted"
        );
    }

    /// Remove the entry for `key`; returns whether one was present
    pub fn remove(&self, key: &EntityKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every entry whose expiry is at or before `now`
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut evicted = 0;

        self.entries.retain(|key, entry| {
            if entry.is_expired(now) {
                tracing::debug!(key = %key, expire_at = %entry.expire_at, "Entry expired");
                evicted += 1;
                false
            } else {
                true
            }
        });

        evicted
    }

    /// Owned copy of the current contents, sorted by key
    ///
    /// Shard locks are released before this returns, so callers may take their
    /// time with the result while writers continue.
    pub fn snapshot(&self) -> Vec<(EntityKey, EventRecord)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.value().payload.clone()))
            .collect();

        entries.sort_by_key(|(key, _)| *key);
        entries
    }

    pub fn get(&self, key: &EntityKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
