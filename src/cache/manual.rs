use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::store::{LocalCache, ShardedHashMapStore};
use crate::traits::Cache;

/// A manually populated cache.
///
/// All behavior comes from the [`Cache`] trait's default methods.
///
/// ```
/// use loadkit::builder::CacheBuilder;
/// use loadkit::error::CacheError;
/// use loadkit::traits::Cache;
///
/// let cache = CacheBuilder::<&str, u32>::new().build();
/// cache.put("a", 1);
/// assert_eq!(cache.get_if_present(&"a"), Some(1));
///
/// assert_eq!(cache.get_with("b", |_| Ok(Some(2))).unwrap(), Some(2));
/// assert!(cache.get_with("c", |_| Err(CacheError::msg("down"))).is_err());
/// assert_eq!(cache.estimated_size(), 2);
///
/// cache.invalidate_all();
/// assert_eq!(cache.estimated_size(), 0);
/// ```
pub struct LocalManualCache<K, V, C = ShardedHashMapStore<K, V>> {
    cache: Arc<C>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, C: LocalCache<K, V>> LocalManualCache<K, V, C> {
    /// Creates a cache over `cache`.
    pub fn new(cache: Arc<C>) -> Self {
        Self {
            cache,
            _marker: PhantomData,
        }
    }
}

impl<K, V, C: LocalCache<K, V>> Cache<K, V> for LocalManualCache<K, V, C> {
    type Store = C;

    fn cache(&self) -> &Arc<C> {
        &self.cache
    }
}

impl<K, V, C> Clone for LocalManualCache<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            _marker: PhantomData,
        }
    }
}

impl<K, V, C: fmt::Debug> fmt::Debug for LocalManualCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalManualCache")
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::ConcurrentMap;
    use crate::stats::ConcurrentStatsCounter;
    use crate::time::FakeTicker;

    fn manual() -> LocalManualCache<u32, String> {
        let store = ShardedHashMapStore::new(4).with_stats(
            Arc::new(ConcurrentStatsCounter::new()),
            Arc::new(FakeTicker::new()),
        );
        LocalManualCache::new(Arc::new(store))
    }

    #[test]
    fn get_if_present_records_stats() {
        let cache = manual();
        assert_eq!(cache.get_if_present(&1), None);
        cache.put(1, "one".to_string());
        assert_eq!(cache.get_if_present(&1), Some("one".to_string()));

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[test]
    fn get_with_loads_once() {
        let cache = manual();
        assert_eq!(cache.get_with(1, |k| Ok(Some(k.to_string()))).unwrap(), Some("1".to_string()));
        assert_eq!(cache.get_with(1, |_| Ok(Some("other".to_string()))).unwrap(), Some("1".to_string()));

        let stats = cache.stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.load_success_count, 1);
    }

    #[test]
    fn invalidation() {
        let cache = manual();
        cache.put_all((0..5).map(|i| (i, i.to_string())));
        assert_eq!(cache.estimated_size(), 5);

        cache.invalidate(&0);
        cache.invalidate_keys(&[1, 2, 9]);
        assert_eq!(cache.estimated_size(), 2);

        let present = cache.get_all_present(&[3, 4, 5]);
        assert_eq!(present.len(), 2);

        cache.invalidate_all();
        cache.invalidate_all();
        cache.clean_up();
        cache.clean_up();
        assert_eq!(cache.estimated_size(), 0);
    }

    #[test]
    fn as_map_shares_storage() {
        let cache = manual();
        cache.as_map().put(7, "seven".to_string());
        assert_eq!(cache.get_if_present(&7), Some("seven".to_string()));
        cache.put(8, "eight".to_string());
        assert!(cache.as_map().contains_key(&8));
    }
}
