use std::collections::HashMap;
use std::future::Future;
use tokio::sync::RwLock;
use tracing::debug;

/// Keyed store for query results that can be dropped when the underlying data changes.
pub struct QueryCache<T> {
    entries: RwLock<Entries<T>>,
}

struct Entries<T> {
    values: HashMap<String, T>,
    /// Bumped on every invalidation so fetches started earlier don't write back
    generations: HashMap<String, u64>,
}

impl<T> Entries<T> {
    fn generation(&self, key: &str) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }
}

impl<T: Clone> QueryCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries {
                values: HashMap::new(),
                generations: HashMap::new(),
            }),
        }
    }

    /// Returns the cached value for `key`, or runs `fetch` and caches its result.
    /// Failed fetches are not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let started_at = {
            let entries = self.entries.read().await;
            if let Some(value) = entries.values.get(key) {
                debug!(key, "Query cache hit");
                return Ok(value.clone());
            }
            entries.generation(key)
        };

        debug!(key, "Query cache miss");
        let value = fetch().await?;

        let mut entries = self.entries.write().await;
        if entries.generation(key) == started_at {
            entries.values.insert(key.to_string(), value.clone());
        } else {
            debug!(key, "Query cache entry invalidated during fetch, not stored");
        }
        Ok(value)
    }

    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        *entries.generations.entry(key.to_string()).or_insert(0) += 1;
        if entries.values.remove(key).is_some() {
            debug!(key, "Query cache entry invalidated");
        }
    }

    #[cfg(test)]
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.values.contains_key(key)
    }
}

impl<T: Clone> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Result<u32, ()> = cache
                .get_or_fetch("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(value, Ok(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = QueryCache::new();
        let _: Result<u32, ()> = cache.get_or_fetch("k", || async { Ok(1) }).await;
        cache.invalidate("k").await;
        assert!(!cache.contains("k").await);

        let value: Result<u32, ()> = cache.get_or_fetch("k", || async { Ok(2) }).await;
        assert_eq!(value, Ok(2));
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache: QueryCache<u32> = QueryCache::new();
        let failed: Result<u32, &str> = cache.get_or_fetch("k", || async { Err("down") }).await;
        assert_eq!(failed, Err("down"));
        assert!(!cache.contains("k").await);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_overlapping_invalidate_is_not_stored() {
        let cache: Arc<QueryCache<u32>> = Arc::new(QueryCache::new());

        let slow = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch("k", || async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok::<_, ()>(0)
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate("k").await;

        // the in-flight caller still gets its own result
        assert_eq!(slow.await.unwrap(), Ok(0));
        assert!(!cache.contains("k").await);

        let next: Result<u32, ()> = cache.get_or_fetch("k", || async { Ok(1) }).await;
        assert_eq!(next, Ok(1));
        assert_eq!(cache.get_or_fetch("k", || async { Ok::<_, ()>(2) }).await, Ok(1));
    }
}
