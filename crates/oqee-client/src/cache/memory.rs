use dashmap::DashMap;
use time::{Duration, OffsetDateTime};

use super::stats::CacheStats;
use crate::types::CacheEntry;

/// TTL-bounded response cache keyed by request URL.
#[derive(Debug)]
pub struct MemoryCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    ttl: Duration,
    stats: CacheStats,
}

impl<T: Clone> MemoryCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            stats: CacheStats::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let result = self
            .entries
            .get(key)
            .and_then(|entry| self.live_value(&entry));

        if result.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        result
    }

    /// Variant of [`get`](Self::get) that also tracks the byte volume served
    /// from cache.
    pub fn get_with_size(&self, key: &str, size_fn: impl FnOnce(&T) -> usize) -> Option<T> {
        let result = self.get(key);
        if let Some(value) = &result {
            self.stats.record_bytes(size_fn(value) as u64);
        }
        result
    }

    pub fn insert(&self, key: impl Into<String>, value: T) {
        let entry = CacheEntry {
            value,
            stored_at: OffsetDateTime::now_utc(),
        };
        self.entries.insert(key.into(), entry);
        self.stats.set_entry_count(self.entries.len());
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.stats.set_entry_count(0);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn live_value(&self, entry: &CacheEntry<T>) -> Option<T> {
        if OffsetDateTime::now_utc() - entry.stored_at <= self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }
}
