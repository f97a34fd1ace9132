//! Expiring in-memory cache for catalog reads.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::observability::metrics;

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    expires_at: Instant,
}

/// A thread-safe cache whose entries expire after a per-entry TTL.
///
/// Clones share storage.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    inner: Arc<DashMap<K, Slot<V>>>,
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self { inner: Arc::new(DashMap::new()) }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Live value for `key`. Expired entries are evicted on read.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        if let Some(slot) = self.inner.get(key) {
            if slot.expires_at > now {
                metrics::record_cache_event("hit");
                return Some(slot.value.clone());
            }
        }
        self.inner.remove_if(key, |_, slot| slot.expires_at <= now);
        metrics::record_cache_event("miss");
        None
    }

    /// Insert or replace `key`, live for `ttl` from now.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.inner.insert(key, Slot { value, expires_at });
    }

    /// Remove `key` whether or not it has expired.
    pub fn invalidate(&self, key: &K) {
        self.inner.remove(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.len();
        self.inner.retain(|_, slot| slot.expires_at > now);
        before - self.inner.len()
    }

    /// Entry count, expired entries included until purged.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
