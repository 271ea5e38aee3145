use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::shared::AppError;

/// Pattern that matches every analytics entry
pub const ANALYTICS_KEY_PATTERN: &str = "analytics:*";

/// Key/value cache wrapped around analytics reads
///
/// A `pattern` ending in `*` matches every key with that prefix, any other
/// pattern matches one key exactly. Every `invalidate` advances the cache
/// generation.
#[async_trait]
pub trait AnalyticsCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value, ttl: Duration);
    async fn invalidate(&self, pattern: &str) -> usize;

    /// Current generation, read before computing a value to store
    async fn generation(&self) -> u64;

    /// Stores the value only if no invalidation happened since `generation`
    async fn set_if_generation(
        &self,
        key: &str,
        value: Value,
        ttl: Duration,
        generation: u64,
    ) -> bool;
}

/// TTLs for how often each family of analytics results changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTiers {
    /// Standings, matchups and top scorers
    pub medium: Duration,
    /// Rate, trend and availability aggregates
    pub low: Duration,
}

impl CacheTiers {
    pub fn uniform(ttl: Duration) -> Self {
        Self {
            medium: ttl,
            low: ttl,
        }
    }
}

impl Default for CacheTiers {
    fn default() -> Self {
        Self {
            medium: Duration::from_secs(900),
            low: Duration::from_secs(3600),
        }
    }
}

/// Builds `prefix:k1:v1|k2:v2` with parameters sorted by name; `None` values are skipped
pub fn cache_key(prefix: &str, params: &[(&str, Option<String>)]) -> String {
    let mut present: Vec<(&str, &str)> = params
        .iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (*name, v)))
        .collect();
    present.sort_by(|a, b| a.0.cmp(b.0));

    if present.is_empty() {
        return prefix.to_string();
    }

    let joined = present
        .iter()
        .map(|(name, value)| format!("{}:{}", name, value))
        .collect::<Vec<_>>()
        .join("|");
    format!("{}:{}", prefix, joined)
}

fn matches_pattern(key: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

/// Serves `key` from the cache or computes, stores and returns it
///
/// Cache failures never fail the read: an undecodable entry is recomputed.
/// A value computed across an invalidation is returned but not stored, since
/// its snapshot may predate the write that caused the invalidation.
pub async fn cached<T, F, Fut>(
    cache: &dyn AnalyticsCache,
    key: &str,
    ttl: Duration,
    compute: F,
) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    if let Some(hit) = cache.get(key).await {
        match serde_json::from_value::<T>(hit) {
            Ok(value) => {
                debug!(key = %key, "Analytics cache hit");
                return Ok(value);
            }
            Err(e) => warn!(key = %key, error = %e, "Discarding undecodable cache entry"),
        }
    }

    let generation = cache.generation().await;
    let value = compute().await?;
    match serde_json::to_value(&value) {
        Ok(json) => {
            if !cache.set_if_generation(key, json, ttl, generation).await {
                debug!(key = %key, "Cache invalidated during compute, result not stored");
            }
        }
        Err(e) => warn!(key = %key, error = %e, "Analytics result not cacheable"),
    }
    Ok(value)
}

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    generation: u64,
}

impl CacheState {
    /// Drops every expired entry and stores the new one
    fn store(&mut self, key: &str, value: Value, ttl: Duration) {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let swept = before - self.entries.len();
        if swept > 0 {
            debug!(swept, "Expired cache entries swept");
        }

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }
}

/// Process-local cache with per-entry expiry
///
/// Expired entries are swept on every write, so keys that are never read
/// again do not accumulate.
#[derive(Clone, Default)]
pub struct InMemoryAnalyticsCache {
    state: Arc<RwLock<CacheState>>,
}

impl InMemoryAnalyticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }
}

#[async_trait]
impl AnalyticsCache for InMemoryAnalyticsCache {
    async fn get(&self, key: &str) -> Option<Value> {
        {
            let state = self.state.read().await;
            match state.entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.value.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        // expired
        let mut state = self.state.write().await;
        if state
            .entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            state.entries.remove(key);
        }
        None
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.state.write().await.store(key, value, ttl);
    }

    async fn invalidate(&self, pattern: &str) -> usize {
        let mut state = self.state.write().await;
        state.generation += 1;
        let before = state.entries.len();
        state.entries.retain(|key, _| !matches_pattern(key, pattern));
        let removed = before - state.entries.len();
        if removed > 0 {
            debug!(pattern = %pattern, removed, "Cache entries invalidated");
        }
        removed
    }

    async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    async fn set_if_generation(
        &self,
        key: &str,
        value: Value,
        ttl: Duration,
        generation: u64,
    ) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return false;
        }
        state.store(key, value, ttl);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cache_key_sorts_and_skips_missing_params() {
        let key = cache_key(
            "analytics:consistency",
            &[
                ("playerId", Some("p1".to_string())),
                ("metric", Some("goals".to_string())),
                ("unused", None),
            ],
        );
        assert_eq!(key, "analytics:consistency:metric:goals|playerId:p1");
        assert_eq!(cache_key("analytics:standings", &[]), "analytics:standings");
    }

    #[tokio::test]
    async fn test_expired_entries_are_not_served() {
        let cache = InMemoryAnalyticsCache::new();
        cache.set("analytics:a", json!(1), Duration::ZERO).await;
        cache.set("analytics:b", json!(2), Duration::from_secs(60)).await;

        assert!(cache.get("analytics:a").await.is_none());
        assert_eq!(cache.get("analytics:b").await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_writes_sweep_expired_entries_under_other_keys() {
        let cache = InMemoryAnalyticsCache::new();
        cache
            .set("analytics:playerVsTeam:playerId:p1|teamId:t1", json!({}), Duration::from_millis(5))
            .await;
        cache
            .set("analytics:injuryBurden:today:2024-09-10", json!([]), Duration::from_millis(5))
            .await;
        assert_eq!(cache.len().await, 2);

        tokio::time::sleep(Duration::from_millis(20)).await;
        cache
            .set("analytics:standings", json!([]), Duration::from_secs(60))
            .await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.get("analytics:standings").await.is_some());
    }

    #[tokio::test]
    async fn test_stale_set_after_invalidation_is_skipped() {
        let cache = InMemoryAnalyticsCache::new();
        let ttl = Duration::from_secs(60);

        let generation = cache.generation().await;
        cache.invalidate(ANALYTICS_KEY_PATTERN).await;
        assert!(!cache.set_if_generation("analytics:standings", json!([]), ttl, generation).await);
        assert!(cache.get("analytics:standings").await.is_none());

        let generation = cache.generation().await;
        assert!(cache.set_if_generation("analytics:standings", json!([]), ttl, generation).await);
        assert!(cache.get("analytics:standings").await.is_some());
    }

    #[tokio::test]
    async fn test_cached_does_not_store_result_computed_across_invalidation() {
        let cache = InMemoryAnalyticsCache::new();

        let value: Vec<u32> = cached(&cache, "analytics:standings", Duration::from_secs(60), || async {
            // a completion commits while this read is still computing
            cache.invalidate(ANALYTICS_KEY_PATTERN).await;
            Ok(vec![0])
        })
        .await
        .unwrap();

        assert_eq!(value, vec![0]);
        assert!(cache.get("analytics:standings").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_prefix_and_exact() {
        let cache = InMemoryAnalyticsCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("analytics:standings", json!([]), ttl).await;
        cache.set("analytics:top", json!([]), ttl).await;
        cache.set("other", json!([]), ttl).await;

        assert_eq!(cache.invalidate("other").await, 1);
        assert_eq!(cache.invalidate(ANALYTICS_KEY_PATTERN).await, 2);
        assert_eq!(cache.invalidate(ANALYTICS_KEY_PATTERN).await, 0);
    }

    #[tokio::test]
    async fn test_cached_computes_once() {
        let cache = InMemoryAnalyticsCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<u32> = cached(&cache, "analytics:x", Duration::from_secs(60), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1, 2, 3])
            })
            .await
            .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = InMemoryAnalyticsCache::new();
        let result: Result<Vec<u32>, AppError> =
            cached(&cache, "analytics:y", Duration::from_secs(60), || async {
                Err(AppError::BadRequest("nope".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert!(cache.get("analytics:y").await.is_none());
    }
}
