//! # Cache Facades
//!
//! The user-facing cache operations, written once as default methods over a
//! backing store accessor so every concrete cache shares the same semantics.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────┐
//!   │                Cache<K, V>                   │
//!   │                                              │
//!   │  cache() → &Arc<Store>        (required)     │
//!   │  estimated_size / clean_up                   │
//!   │  get_if_present / get_with / get_all_present │
//!   │  put / put_all                               │
//!   │  invalidate / invalidate_keys / invalidate_all│
//!   │  stats / as_map                              │
//!   └──────────────────────┬───────────────────────┘
//!                          │
//!                          ▼
//!   ┌──────────────────────────────────────────────┐
//!   │             LoadingCache<K, V>               │
//!   │                                              │
//!   │  loader() / has_bulk_loader() (required)     │
//!   │  get / get_all / bulk_load / refresh         │
//!   └──────────────────────────────────────────────┘
//! ```
//!
//! ## Trait Summary
//!
//! | Trait          | Extends  | Purpose                                        |
//! |----------------|----------|------------------------------------------------|
//! | `Cache`        | -        | Manual population, lookup, invalidation, stats |
//! | `LoadingCache` | `Cache`  | Population through a [`CacheLoader`]           |
//!
//! ## Statistics
//!
//! | Operation        | Hits            | Misses          | Loads                      |
//! |------------------|-----------------|-----------------|----------------------------|
//! | `get_if_present` | 1 if present    | 1 if absent     | -                          |
//! | `get_with`/`get` | 1 if present    | 1 if absent     | 1 if absent                |
//! | `get_all`        | present count   | missing count   | 1 bulk, or 1 per missing   |
//! | `refresh`        | -               | -               | 1 when the task runs       |
//!
//! ## Example Usage
//!
//! ```
//! use loadkit::builder::CacheBuilder;
//! use loadkit::loader::loader_fn;
//! use loadkit::traits::{Cache, LoadingCache};
//!
//! let cache = CacheBuilder::new()
//!     .record_stats(true)
//!     .build_loading(loader_fn(|key: &u64| Ok(Some(key * 10))));
//!
//! assert_eq!(cache.get(&1).unwrap(), Some(10));
//! assert_eq!(cache.get_if_present(&1), Some(10));
//!
//! let all = cache.get_all(&[1, 2, 3]).unwrap();
//! assert_eq!(all.len(), 3);
//!
//! let stats = cache.stats();
//! assert_eq!(stats.hit_count, 2);
//! assert_eq!(stats.miss_count, 3);
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::error::LoadResult;
use crate::executor::Task;
use crate::loader::CacheLoader;
use crate::map::ConcurrentMap;
use crate::stats::{CacheStats, StatsCounter};
use crate::store::LocalCache;
use crate::time::Ticker;

/// A cache populated manually or through per-call mapping functions.
pub trait Cache<K, V> {
    /// The backing store.
    type Store: LocalCache<K, V>;

    fn cache(&self) -> &Arc<Self::Store>;

    /// Approximate number of entries.
    fn estimated_size(&self) -> u64 {
        self.cache().mapping_count()
    }

    /// Performs any pending maintenance. Safe to call at any time.
    fn clean_up(&self) {
        self.cache().clean_up();
    }

    /// Returns the cached value for `key`, recording a hit or miss.
    fn get_if_present(&self, key: &K) -> Option<V> {
        self.cache().get_if_present(key, true)
    }

    /// Returns the cached value for `key`, computing it with `f` if absent.
    ///
    /// The computation is atomic: concurrent callers for the same key wait
    /// for one invocation of `f`. An `Err` from `f` is returned and nothing
    /// is cached.
    fn get_with<F>(&self, key: K, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&K) -> LoadResult<Option<V>>,
    {
        self.cache().compute_if_absent(key, f)
    }

    /// Returns the cached values for those `keys` that are present.
    fn get_all_present(&self, keys: &[K]) -> HashMap<K, V> {
        self.cache().get_all_present(keys)
    }

    fn put(&self, key: K, value: V) {
        self.cache().put(key, value);
    }

    fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.cache().put_all(entries);
    }

    fn invalidate(&self, key: &K) {
        self.cache().remove(key);
    }

    fn invalidate_keys<'a, I>(&self, keys: I)
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let cache = self.cache();
        for key in keys {
            cache.remove(key);
        }
    }

    /// Removes every entry.
    fn invalidate_all(&self) {
        self.cache().clear();
    }

    /// A snapshot of the cache's statistics.
    fn stats(&self) -> CacheStats {
        self.cache().stats_counter().snapshot()
    }

    /// The cache as a concurrent map. Writes through the map are visible to
    /// the cache and vice versa.
    fn as_map(&self) -> &Self::Store {
        self.cache()
    }
}

/// A cache that computes missing values with a [`CacheLoader`].
pub trait LoadingCache<K, V>: Cache<K, V> {
    fn loader(&self) -> &Arc<dyn CacheLoader<K, V>>;

    /// Whether the loader supports bulk loading, decided at construction.
    fn has_bulk_loader(&self) -> bool;

    /// Returns the value for `key`, loading it if absent.
    ///
    /// A loader failure is returned to the caller and recorded as a load
    /// failure; nothing is cached.
    fn get(&self, key: &K) -> LoadResult<Option<V>>
    where
        K: Clone,
    {
        let loader = self.loader();
        self.cache().compute_if_absent(key.clone(), |k| loader.load(k))
    }

    /// Returns the values for `keys`, loading the missing ones.
    ///
    /// Duplicate keys are resolved once. Keys for which the loader produced
    /// no value are absent from the result.
    fn get_all(&self, keys: &[K]) -> LoadResult<HashMap<K, V>>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        let cache = self.cache();
        let mut seen = FxHashSet::default();
        let mut result = HashMap::with_capacity(keys.len());
        let mut keys_to_load = Vec::new();
        for key in keys {
            if !seen.insert(key) {
                continue;
            }
            match cache.get_if_present(key, false) {
                Some(value) => {
                    result.insert(key.clone(), value);
                },
                None => keys_to_load.push(key.clone()),
            }
        }
        cache.stats_counter().record_hits(result.len() as u64);
        if keys_to_load.is_empty() {
            return Ok(result);
        }
        self.bulk_load(&keys_to_load, &mut result)?;
        Ok(result)
    }

    /// Loads `keys_to_load` into the cache and copies the loaded values for
    /// those keys into `result`.
    ///
    /// Records one miss per key. With a bulk loader, one load success or
    /// failure is recorded with the elapsed time whether `load_all` returns
    /// or unwinds.
    fn bulk_load(&self, keys_to_load: &[K], result: &mut HashMap<K, V>) -> LoadResult<()>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        let cache = self.cache();
        let loader = self.loader();
        cache.stats_counter().record_misses(keys_to_load.len() as u64);

        if !self.has_bulk_loader() {
            for key in keys_to_load {
                let value = cache.compute_with(key.clone(), |k, _| loader.load(k), false, false)?;
                if let Some(value) = value {
                    result.insert(key.clone(), value);
                }
            }
            return Ok(());
        }

        let mut timer = LoadTimer::start(cache.ticker().as_ref(), cache.stats_counter().as_ref());
        let loaded = loader.load_all(keys_to_load)?;
        for key in keys_to_load {
            if let Some(value) = loaded.get(key) {
                result.insert(key.clone(), value.clone());
            }
        }
        timer.success = !loaded.is_empty();
        tracing::trace!(
            requested = keys_to_load.len(),
            loaded = loaded.len(),
            "bulk load complete"
        );
        cache.put_all(loaded);
        Ok(())
    }

    /// Reloads `key` asynchronously on the cache's executor.
    ///
    /// An absent key is loaded with [`CacheLoader::load`]; a present one is
    /// recomputed with [`CacheLoader::reload`]. The entry is updated
    /// atomically when the computation finishes. Failures (including
    /// panics) are logged and otherwise discarded.
    fn refresh(&self, key: K)
    where
        K: Send + 'static,
        V: 'static,
        Self::Store: 'static,
    {
        let cache = Arc::clone(self.cache());
        let loader = Arc::clone(self.loader());
        let task: Task = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                cache.compute_with(
                    key,
                    |k, old| match old {
                        Some(old) => loader.reload(k, old),
                        None => loader.load(k),
                    },
                    false,
                    false,
                )
            }));
            match outcome {
                Ok(Ok(_)) => {},
                Ok(Err(err)) => tracing::warn!(error = %err, "exception thrown during refresh"),
                Err(_) => tracing::warn!("panic during refresh"),
            }
        });
        self.cache().executor().execute(task);
    }
}

/// Records a bulk load's outcome and latency when dropped, so the
/// accounting happens on every exit path.
struct LoadTimer<'a> {
    ticker: &'a dyn Ticker,
    stats: &'a dyn StatsCounter,
    start: u64,
    success: bool,
}

impl<'a> LoadTimer<'a> {
    fn start(ticker: &'a dyn Ticker, stats: &'a dyn StatsCounter) -> Self {
        Self {
            ticker,
            stats,
            start: ticker.read(),
            success: false,
        }
    }
}

impl Drop for LoadTimer<'_> {
    fn drop(&mut self) {
        let load_time = self.ticker.read().saturating_sub(self.start);
        if self.success {
            self.stats.record_load_success(load_time);
        } else {
            self.stats.record_load_failure(load_time);
        }
    }
}
