use crate::Cache;
use crate::error::CacheError;
use crate::keys;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Writes between full sweeps of expired entries.
const SWEEP_EVERY: usize = 64;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// An in-process TTL cache. Expired entries are dropped on read, during
/// pattern deletion, and by a sweep every `SWEEP_EVERY` writes.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    writes: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl Cache for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);

        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            let evicted = self.evict_expired();
            if evicted > 0 {
                tracing::debug!(evicted, "Swept expired cache entries.");
            }
        }
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|key, entry| entry.expires_at > now && !keys::matches(pattern, key));
        Ok(before.saturating_sub(self.entries.len()))
    }
}

/// A cache that stores nothing; every read misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

#[async_trait]
impl Cache for NoCache {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set_with_ttl(
        &self,
        _key: &str,
        _value: String,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete_pattern(&self, _pattern: &str) -> Result<usize, CacheError> {
        Ok(0)
    }
}
