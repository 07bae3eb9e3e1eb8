use std::fmt;
use std::sync::Arc;

use crate::loader::CacheLoader;
use crate::store::{LocalCache, ShardedHashMapStore};
use crate::traits::{Cache, LoadingCache};

/// A cache that computes missing values with a [`CacheLoader`].
///
/// Whether the loader supports bulk loading is read once, here, when the
/// cache is created.
pub struct LocalLoadingCache<K, V, C = ShardedHashMapStore<K, V>> {
    cache: Arc<C>,
    loader: Arc<dyn CacheLoader<K, V>>,
    has_bulk_loader: bool,
}

impl<K, V, C: LocalCache<K, V>> LocalLoadingCache<K, V, C> {
    /// Creates a cache over `cache` that loads misses with `loader`.
    ///
    /// Whether `loader` supports bulk loading is read once, here.
    pub fn new(cache: Arc<C>, loader: Arc<dyn CacheLoader<K, V>>) -> Self {
        let has_bulk_loader = loader.has_bulk_load();
        Self {
            cache,
            loader,
            has_bulk_loader,
        }
    }
}

impl<K, V, C: LocalCache<K, V>> Cache<K, V> for LocalLoadingCache<K, V, C> {
    type Store = C;

    fn cache(&self) -> &Arc<C> {
        &self.cache
    }
}

impl<K, V, C: LocalCache<K, V>> LoadingCache<K, V> for LocalLoadingCache<K, V, C> {
    fn loader(&self) -> &Arc<dyn CacheLoader<K, V>> {
        &self.loader
    }

    fn has_bulk_loader(&self) -> bool {
        self.has_bulk_loader
    }
}

impl<K, V, C> Clone for LocalLoadingCache<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            loader: Arc::clone(&self.loader),
            has_bulk_loader: self.has_bulk_loader,
        }
    }
}

impl<K, V, C: fmt::Debug> fmt::Debug for LocalLoadingCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalLoadingCache")
            .field("cache", &self.cache)
            .field("has_bulk_loader", &self.has_bulk_loader)
            .finish()
    }
}
