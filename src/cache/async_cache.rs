//! A cache of pending computations.
//!
//! Values are [`Pending`] handles. [`get`](LocalAsyncCache::get) installs an
//! in-flight handle atomically and computes the value on the store's
//! executor, so concurrent callers for the same key share one computation. A
//! computation that fails is removed from the cache, provided the entry still
//! holds that same computation.
//!
//! [`as_map`](LocalAsyncCache::as_map) exposes the cache as a map of realized
//! values through [`AsyncValueView`].
//!
//! ## Example Usage
//!
//! ```
//! use loadkit::builder::CacheBuilder;
//! use loadkit::executor::SameThreadExecutor;
//! use loadkit::map::ConcurrentMap;
//! use std::sync::Arc;
//!
//! let cache = CacheBuilder::<u64, String>::new()
//!     .executor(Arc::new(SameThreadExecutor))
//!     .build_async();
//!
//! let pending = cache.get(1, |key| Ok(format!("value-{key}")));
//! assert_eq!(pending.wait().unwrap(), "value-1");
//! assert_eq!(cache.as_map().get(&1), Some("value-1".to_string()));
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{CacheError, LoadResult};
use crate::executor::Task;
use crate::pending::Pending;
use crate::stats::CacheStats;
use crate::store::{LocalCache, ShardedHashMapStore};
use crate::view::AsyncValueView;

/// A cache whose values are computed asynchronously.
pub struct LocalAsyncCache<K, V, C = ShardedHashMapStore<K, Pending<V>>> {
    cache: Arc<C>,
    view: AsyncValueView<K, V, C>,
}

impl<K, V, C> LocalAsyncCache<K, V, C>
where
    K: Clone,
    V: Clone + Send + Sync + 'static,
    C: LocalCache<K, Pending<V>>,
{
    /// Wraps `cache`, whose values are pending computations.
    pub fn new(cache: Arc<C>) -> Self {
        let view = AsyncValueView::new(Arc::clone(&cache));
        Self { cache, view }
    }

    /// The backing store of computations.
    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Number of computations held, finished or not.
    pub fn estimated_size(&self) -> u64 {
        self.cache.mapping_count()
    }

    pub fn clean_up(&self) {
        self.cache.clean_up();
    }

    /// Returns the computation for `key`, recording a hit or miss. The
    /// computation may still be in flight.
    pub fn get_if_present(&self, key: &K) -> Option<Pending<V>> {
        self.cache.get_if_present(key, true)
    }

    /// Returns the computation for `key`, starting one with `f` on the
    /// executor if absent.
    ///
    /// The load success or failure and its latency are recorded when `f`
    /// finishes. A failed or panicking computation fails the returned handle
    /// and is removed from the cache.
    pub fn get<F>(&self, key: K, f: F) -> Pending<V>
    where
        K: Send + 'static,
        C: 'static,
        F: FnOnce(&K) -> LoadResult<V> + Send + 'static,
    {
        let stats = self.cache.stats_counter();
        if let Some(existing) = self.cache.get_if_present(&key, false) {
            stats.record_hits(1);
            return existing;
        }
        let pending = Pending::new();
        if let Some(existing) = self.cache.put_if_absent(key.clone(), pending.clone()) {
            // Another caller installed a computation first.
            stats.record_hits(1);
            return existing;
        }
        stats.record_misses(1);

        let cache = Arc::clone(&self.cache);
        let handle = pending.clone();
        let task: Task = Box::new(move || {
            let ticker = cache.ticker();
            let stats = cache.stats_counter();
            let start = ticker.read();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(&key)));
            let load_time = ticker.read().saturating_sub(start);
            let err = match outcome {
                Ok(Ok(value)) => {
                    stats.record_load_success(load_time);
                    handle.complete(value);
                    return;
                },
                Ok(Err(err)) => err,
                Err(_) => {
                    tracing::warn!("panic during asynchronous load");
                    CacheError::msg("asynchronous load panicked")
                },
            };
            stats.record_load_failure(load_time);
            handle.fail(err);
            cache.remove_value(&key, &handle);
        });
        self.cache.executor().execute(task);
        pending
    }

    /// Associates a computation with `key`, replacing any existing one.
    pub fn put(&self, key: K, value: Pending<V>) {
        self.cache.put(key, value);
    }

    pub fn invalidate(&self, key: &K) {
        self.cache.remove(key);
    }

    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats_counter().snapshot()
    }

    /// The cache as a map of successfully computed values.
    pub fn as_map(&self) -> &AsyncValueView<K, V, C> {
        &self.view
    }
}

impl<K, V, C> Clone for LocalAsyncCache<K, V, C>
where
    K: Clone,
    V: Clone + Send + Sync + 'static,
    C: LocalCache<K, Pending<V>>,
{
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.cache))
    }
}

impl<K, V, C: fmt::Debug> fmt::Debug for LocalAsyncCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAsyncCache")
            .field("cache", &self.cache)
            .finish()
    }
}
