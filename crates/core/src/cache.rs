use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// A cached value and the time it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<V> {
    pub value: V,
    pub fetched_at: DateTime<Utc>,
}

/// Time-bounded key → value store with stale reads.
///
/// The TTL only decides freshness. Entries are never evicted: once stale
/// they stay as the fallback value until a newer fetch overwrites them.
/// Writes are atomic per key; an older fetch never replaces a newer one.
pub struct TtlCache<V> {
    name: &'static str,
    ttl: Duration,
    entries: RwLock<HashMap<String, Cached<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The entry, only while `now - fetched_at < ttl`.
    pub fn get_fresh(&self, key: &str, now: DateTime<Utc>) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if now - entry.fetched_at < self.ttl => {
                debug!(cache = self.name, key, "Cache HIT");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(cache = self.name, key, "Cache STALE");
                None
            }
            None => {
                debug!(cache = self.name, key, "Cache MISS");
                None
            }
        }
    }

    /// The entry regardless of age.
    pub fn get_any(&self, key: &str) -> Option<Cached<V>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    pub fn put(&self, key: impl Into<String>, value: V, fetched_at: DateTime<Utc>) {
        let key = key.into();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.get(&key) {
            Some(existing) if existing.fetched_at > fetched_at => {
                debug!(cache = self.name, key = %key, "Cache PUT skipped, newer entry present");
            }
            _ => {
                debug!(cache = self.name, key = %key, "Cache PUT");
                entries.insert(key, Cached { value, fetched_at });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
