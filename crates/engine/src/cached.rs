//! Fail-open access to the read-through cache.
//!
//! Every cache error is logged and treated as a miss; none of them reach the
//! caller.

use crate::error::EngineError;
use cache::{Cache, keys};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Returns the cached value under `key`, or computes, stores and returns it.
pub(crate) async fn read_through<T, F>(
    cache: &dyn Cache,
    key: &str,
    ttl: Duration,
    compute: F,
) -> Result<T, EngineError>
where
    T: Serialize + DeserializeOwned + Sync,
    F: Future<Output = Result<T, EngineError>>,
{
    match cache::get_json::<T>(cache, key).await {
        Ok(Some(hit)) => {
            debug!(key, backend = cache.name(), "Cache hit.");
            return Ok(hit);
        }
        Ok(None) => {}
        Err(e) => warn!(
            key,
            backend = cache.name(),
            error = %e,
            "Cache read failed; computing directly."
        ),
    }

    let value = compute.await?;
    if let Err(e) = cache::set_json(cache, key, &value, ttl).await {
        warn!(key, backend = cache.name(), error = %e, "Cache write failed.");
    }
    Ok(value)
}

/// Drops every cached analytics view and trade listing of `owner_id`.
pub(crate) async fn invalidate_owner(cache: &dyn Cache, owner_id: Uuid) {
    for pattern in [keys::owner_analytics(owner_id), keys::owner_trades(owner_id)] {
        match cache.delete_pattern(&pattern).await {
            Ok(removed) => debug!(%owner_id, pattern, removed, "Cache invalidated."),
            Err(e) => warn!(%owner_id, pattern, error = %e, "Cache invalidation failed."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cache::{CacheError, MemoryCache};

    struct BrokenCache;

    #[async_trait]
    impl Cache for BrokenCache {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }

        async fn set_with_ttl(&self, _: &str, _: String, _: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }

        async fn delete_pattern(&self, _pattern: &str) -> Result<usize, CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);

        let first: u32 = read_through(&cache, "k", ttl, async { Ok(7) }).await.unwrap();
        let second: u32 = read_through(&cache, "k", ttl, async { Ok(8) }).await.unwrap();
        assert_eq!((first, second), (7, 7));
    }

    #[tokio::test]
    async fn broken_cache_falls_back_to_computation() {
        let value: u32 = read_through(&BrokenCache, "k", Duration::from_secs(60), async { Ok(3) })
            .await
            .unwrap();
        assert_eq!(value, 3);
        invalidate_owner(&BrokenCache, Uuid::new_v4()).await;
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("k", "not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let value: u32 = read_through(&cache, "k", Duration::from_secs(60), async { Ok(5) })
            .await
            .unwrap();
        assert_eq!(value, 5);
    }
}
