//! Statement-keyed result cache.
//!
//! Maps a finalized statement string to a previously retrieved payload so
//! that a logically identical request never refetches within the retention
//! window. The upstream dataset is read-only, so entries are never updated
//! in place, only inserted or evicted.
//!
//! The cache is bounded two ways: a maximum entry count with
//! oldest-insertion eviction, and a time-to-live after which an entry is
//! dropped on access. Concurrent identical-key races may both fetch and
//! both write (last-write-wins); the cache is a best-effort
//! round-trip saver, not a dedup barrier.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use crate::api::RowSet;

struct CacheEntry {
    payload: Arc<RowSet>,
    inserted_at: Instant,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order; replaced keys keep their original slot.
    order: VecDeque<String>,
}

/// A bounded, process-wide cache of statement results.
pub struct StatementCache {
    inner: RwLock<CacheInner>,
    max_entries: usize,
    ttl: Duration,
}

impl StatementCache {
    /// Creates a cache with the given capacity and retention window.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_entries,
            ttl,
        }
    }

    /// Returns the cached payload for a statement, if present and fresh.
    pub fn get(&self, statement: &str) -> Option<Arc<RowSet>> {
        {
            let inner = self.inner.read();
            match inner.entries.get(statement) {
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                    return Some(Arc::clone(&entry.payload));
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Entry exists but is stale; drop it under the write lock.
        let mut inner = self.inner.write();
        if let Some(entry) = inner.entries.get(statement) {
            if entry.inserted_at.elapsed() < self.ttl {
                // Re-inserted between locks.
                return Some(Arc::clone(&entry.payload));
            }
            inner.entries.remove(statement);
            inner.order.retain(|k| k != statement);
            debug!(statement, "evicted expired cache entry");
        }
        None
    }

    /// Stores a payload under a statement key, evicting oldest entries
    /// beyond capacity.
    pub fn put(&self, statement: String, payload: Arc<RowSet>) {
        let mut inner = self.inner.write();
        let entry = CacheEntry {
            payload,
            inserted_at: Instant::now(),
        };
        if inner.entries.insert(statement.clone(), entry).is_none() {
            inner.order.push_back(statement);
        }
        while inner.entries.len() > self.max_entries {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                    debug!(statement = %oldest, "evicted cache entry beyond capacity");
                }
                None => break,
            }
        }
    }

    /// Number of cached statements, including not-yet-collected stale ones.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all entries.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(marker: &str) -> Arc<RowSet> {
        let mut row = serde_json::Map::new();
        row.insert("id".to_string(), serde_json::Value::String(marker.to_string()));
        Arc::new(RowSet {
            rows: vec![row],
            ..Default::default()
        })
    }

    fn cache() -> StatementCache {
        StatementCache::new(4, Duration::from_secs(60))
    }

    #[test]
    fn test_get_returns_stored_payload_unchanged() {
        let cache = cache();
        let stored = payload("a");
        cache.put("SELECT 1".to_string(), Arc::clone(&stored));
        let hit = cache.get("SELECT 1").unwrap();
        assert!(Arc::ptr_eq(&hit, &stored));
    }

    #[test]
    fn test_miss_on_unknown_statement() {
        assert!(cache().get("SELECT 2").is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest_insertion() {
        let cache = StatementCache::new(2, Duration::from_secs(60));
        cache.put("s1".to_string(), payload("1"));
        cache.put("s2".to_string(), payload("2"));
        cache.put("s3".to_string(), payload("3"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("s1").is_none());
        assert!(cache.get("s2").is_some());
        assert!(cache.get("s3").is_some());
    }

    #[test]
    fn test_replacing_a_key_does_not_grow_the_cache() {
        let cache = StatementCache::new(2, Duration::from_secs(60));
        cache.put("s1".to_string(), payload("old"));
        cache.put("s1".to_string(), payload("new"));
        assert_eq!(cache.len(), 1);
        let hit = cache.get("s1").unwrap();
        assert_eq!(hit.rows[0]["id"], "new");
    }

    #[test]
    fn test_expired_entries_are_dropped_on_access() {
        let cache = StatementCache::new(4, Duration::ZERO);
        cache.put("s1".to_string(), payload("1"));
        assert!(cache.get("s1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_empties_the_cache() {
        let cache = cache();
        cache.put("s1".to_string(), payload("1"));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("s1").is_none());
    }
}
