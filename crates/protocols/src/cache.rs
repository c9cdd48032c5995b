//! Append-only, load-once-per-key cache.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Caches values loaded on first use.
///
/// Entries are never replaced or evicted. Concurrent first loads of the same
/// key may both run the loader; the first value written is kept and returned
/// to both callers. Failed loads are not cached.
pub struct LoadOnceCache<K, V> {
    entries: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> LoadOnceCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the cached value for `key`, if loaded.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.entries.read().await.get(key).cloned()
    }

    /// Returns the cached value or runs `load` and caches its result.
    ///
    /// # Errors
    /// Returns the loader's error; nothing is cached in that case.
    pub async fn get_or_try_load<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let loaded = load().await?;
        let mut entries = self.entries.write().await;
        Ok(entries.entry(key).or_insert(loaded).clone())
    }

    /// Number of loaded entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<K, V> Clone for LoadOnceCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> Default for LoadOnceCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_loads_once_per_key() {
        let cache: LoadOnceCache<&str, u8> = LoadOnceCache::new();
        let loads = AtomicU32::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_try_load("usdc", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(6)
                })
                .await
                .unwrap();
            assert_eq!(value, 6);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: LoadOnceCache<u32, String> = LoadOnceCache::new();

        let failed = cache
            .get_or_try_load(1, || async { Err::<String, _>("rpc down") })
            .await;
        assert_eq!(failed, Err("rpc down"));
        assert!(cache.is_empty().await);

        let loaded = cache
            .get_or_try_load(1, || async { Ok::<_, &str>("WETH".to_string()) })
            .await;
        assert_eq!(loaded.as_deref(), Ok("WETH"));
    }

    #[tokio::test]
    async fn test_first_write_wins_across_clones() {
        let cache: LoadOnceCache<u32, u32> = LoadOnceCache::new();
        let shared = cache.clone();

        cache
            .get_or_try_load(7, || async { Ok::<_, ()>(1) })
            .await
            .unwrap();
        let second = shared
            .get_or_try_load(7, || async { Ok::<_, ()>(2) })
            .await
            .unwrap();

        assert_eq!(second, 1);
        assert_eq!(shared.get(&7).await, Some(1));
    }
}
