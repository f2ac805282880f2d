//! Response cache
//!
//! Key/value store with per-entry TTL that agents may consult before doing
//! expensive work. Agents hold it as `Option<Arc<ResponseCache>>`; a missing
//! cache and a cache miss are both ordinary outcomes.
//!
//! Backed by `moka::sync::Cache`, so the entry count is bounded and expired
//! entries are evicted without being read again.

use std::time::{Duration, Instant};

use moka::sync::Cache;
use moka::Expiry;
use serde_json::Value;
use tracing::trace;

use crate::core::config::CacheConfig;

#[derive(Clone)]
struct Entry {
    value: Value,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// TTL cache for agent responses
pub struct ResponseCache {
    entries: Cache<String, Entry>,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(default_ttl: Duration, max_entries: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryTtl)
                .build(),
            default_ttl,
        }
    }

    /// Build from configuration; `None` when caching is disabled
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(Duration::from_secs(config.ttl_secs), config.max_entries))
    }

    /// Fetch a live entry
    pub fn get(&self, key: &str) -> Option<Value> {
        let hit = self.entries.get(key).map(|entry| entry.value);
        trace!(key, hit = hit.is_some(), "Cache lookup");
        hit
    }

    /// Store with the default TTL
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        self.entries.insert(key.into(), Entry { value, ttl });
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every entry whose key starts with `prefix`
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let keys: Vec<_> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key)
            .collect();
        for key in &keys {
            self.entries.invalidate(key.as_str());
        }
        keys.len()
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Run pending evictions now instead of on the next write
    pub fn purge_expired(&self) {
        self.entries.run_pending_tasks();
    }

    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
