//! # EdgeIQ Cache Crate
//!
//! A small read-through cache port in front of the metrics views.
//!
//! The cache is strictly an optimisation. Callers treat every `CacheError` as
//! a miss, so the application behaves the same (only slower) with the cache
//! unreachable or disabled.
//!
//! - `Cache`: the port (`get`, `set_with_ttl`, `delete_pattern`).
//! - `MemoryCache`: an in-process TTL cache on a concurrent map.
//! - `NoCache`: the disabled cache.
//! - `keys`: the key layout shared by readers and invalidators.

pub mod error;
pub mod keys;
pub mod memory;

pub use error::CacheError;
pub use memory::{MemoryCache, NoCache};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// A string key/value cache with per-entry expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_with_ttl(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Deletes the exact key, or every key with the given prefix when the
    /// pattern ends in `*`. Returns how many entries were removed.
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheError>;
}

/// Reads and deserializes a JSON value.
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn Cache,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serializes and stores a JSON value.
pub async fn set_json<T: Serialize + Sync>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), CacheError> {
    let raw = serde_json::to_string(value)?;
    cache.set_with_ttl(key, raw, ttl).await
}
