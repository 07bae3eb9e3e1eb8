//! Cache construction.
//!
//! [`CacheBuilder`] assembles a [`ShardedHashMapStore`] with its
//! collaborators (statistics, time source, executor, removal listener) and
//! wraps it in one of the concrete caches.
//!
//! ## Defaults
//!
//! | Setting            | Default                   |
//! |--------------------|---------------------------|
//! | `initial_capacity` | 0                         |
//! | `shards`           | [`DEFAULT_SHARDS`]        |
//! | `record_stats`     | false                     |
//! | `ticker`           | `SystemTicker` when stats are recorded |
//! | `executor`         | `RayonExecutor`           |
//! | `removal_listener` | none                      |
//!
//! With statistics disabled the store uses a no-op counter and a ticker that
//! always reads zero, so load timing costs nothing.
//!
//! ## Example
//!
//! ```rust
//! use loadkit::builder::{CacheBuilder, CacheConfig};
//! use loadkit::traits::Cache;
//!
//! let config = CacheConfig {
//!     initial_capacity: 128,
//!     shards: 8,
//!     record_stats: true,
//! };
//! let cache = CacheBuilder::<u64, String>::from_config(config).try_build().unwrap();
//! cache.put(1, "one".to_string());
//! assert_eq!(cache.get_if_present(&1), Some("one".to_string()));
//! assert_eq!(cache.stats().hit_count, 1);
//! ```

use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::cache::{LocalAsyncCache, LocalLoadingCache, LocalManualCache};
use crate::error::ConfigError;
use crate::executor::Executor;
use crate::listener::{ReadyValueListener, RemovalListener};
use crate::loader::CacheLoader;
use crate::pending::Pending;
use crate::stats::ConcurrentStatsCounter;
use crate::store::ShardedHashMapStore;
use crate::time::{SystemTicker, Ticker};

/// Shard count used when none is configured.
pub const DEFAULT_SHARDS: usize = 16;

/// Plain-data cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Expected number of entries, spread across shards up front.
    pub initial_capacity: usize,
    /// Number of independently locked shards. Must be greater than zero.
    pub shards: usize,
    pub record_stats: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            shards: DEFAULT_SHARDS,
            record_stats: false,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shards == 0 {
            return Err(ConfigError::new("shard count must be > 0"));
        }
        Ok(())
    }
}

/// Builder for [`LocalManualCache`], [`LocalLoadingCache`], and
/// [`LocalAsyncCache`].
pub struct CacheBuilder<K, V> {
    config: CacheConfig,
    ticker: Option<Arc<dyn Ticker>>,
    executor: Option<Arc<dyn Executor>>,
    listener: Option<Arc<dyn RemovalListener<K, V>>>,
}

impl<K, V> CacheBuilder<K, V> {
    /// Builder with the default [`CacheConfig`].
    pub fn new() -> Self {
        Self::from_config(CacheConfig::default())
    }

    /// Builder starting from `config`.
    pub fn from_config(config: CacheConfig) -> Self {
        Self {
            config,
            ticker: None,
            executor: None,
            listener: None,
        }
    }

    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.config.initial_capacity = initial_capacity;
        self
    }

    pub fn shards(mut self, shards: usize) -> Self {
        self.config.shards = shards;
        self
    }

    /// Enables hit, miss, and load accounting.
    pub fn record_stats(mut self, record_stats: bool) -> Self {
        self.config.record_stats = record_stats;
        self
    }

    /// Time source for load latency. Ignored unless stats are recorded.
    pub fn ticker(mut self, ticker: Arc<dyn Ticker>) -> Self {
        self.ticker = Some(ticker);
        self
    }

    /// Executor for refreshes, asynchronous loads, and removal notifications.
    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn removal_listener(mut self, listener: Arc<dyn RemovalListener<K, V>>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl<K, V> CacheBuilder<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Builds the bare store. A zero shard count is raised to one.
    pub fn build_store(self) -> ShardedHashMapStore<K, V> {
        let Self {
            config,
            ticker,
            executor,
            listener,
        } = self;
        assemble(config, ticker, executor, listener)
    }

    pub fn try_build_store(self) -> Result<ShardedHashMapStore<K, V>, ConfigError> {
        self.config.validate()?;
        Ok(self.build_store())
    }

    pub fn build(self) -> LocalManualCache<K, V> {
        LocalManualCache::new(Arc::new(self.build_store()))
    }

    pub fn try_build(self) -> Result<LocalManualCache<K, V>, ConfigError> {
        self.config.validate()?;
        Ok(self.build())
    }

    pub fn build_loading<L>(self, loader: L) -> LocalLoadingCache<K, V>
    where
        L: CacheLoader<K, V> + 'static,
    {
        LocalLoadingCache::new(Arc::new(self.build_store()), Arc::new(loader))
    }

    pub fn try_build_loading<L>(self, loader: L) -> Result<LocalLoadingCache<K, V>, ConfigError>
    where
        L: CacheLoader<K, V> + 'static,
    {
        self.config.validate()?;
        Ok(self.build_loading(loader))
    }

    /// Builds a cache of pending computations. A removal listener is notified
    /// only for successfully computed values.
    pub fn build_async(self) -> LocalAsyncCache<K, V> {
        let Self {
            config,
            ticker,
            executor,
            listener,
        } = self;
        let listener = listener.map(|inner| {
            Arc::new(ReadyValueListener::new(inner)) as Arc<dyn RemovalListener<K, Pending<V>>>
        });
        LocalAsyncCache::new(Arc::new(assemble(config, ticker, executor, listener)))
    }

    pub fn try_build_async(self) -> Result<LocalAsyncCache<K, V>, ConfigError> {
        self.config.validate()?;
        Ok(self.build_async())
    }
}

impl<K, V> Default for CacheBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for CacheBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("config", &self.config)
            .field("custom_ticker", &self.ticker.is_some())
            .field("custom_executor", &self.executor.is_some())
            .field("has_removal_listener", &self.listener.is_some())
            .finish()
    }
}

fn assemble<K, W>(
    config: CacheConfig,
    ticker: Option<Arc<dyn Ticker>>,
    executor: Option<Arc<dyn Executor>>,
    listener: Option<Arc<dyn RemovalListener<K, W>>>,
) -> ShardedHashMapStore<K, W>
where
    K: Eq + Hash,
{
    let mut store =
        ShardedHashMapStore::with_hasher(config.initial_capacity, config.shards, RandomState::new());
    if config.record_stats {
        let ticker = ticker.unwrap_or_else(|| Arc::new(SystemTicker::new()));
        store = store.with_stats(Arc::new(ConcurrentStatsCounter::new()), ticker);
    }
    if let Some(executor) = executor {
        store = store.with_executor(executor);
    }
    if let Some(listener) = listener {
        store = store.with_removal_listener(listener);
    }
    tracing::debug!(
        shards = store.shard_count(),
        initial_capacity = config.initial_capacity,
        record_stats = config.record_stats,
        "built cache store"
    );
    store
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::executor::SameThreadExecutor;
    use crate::listener::RemovalCause;
    use crate::loader::loader_fn;
    use crate::map::ConcurrentMap;
    use crate::store::LocalCache;
    use crate::time::FakeTicker;
    use crate::traits::{Cache, LoadingCache};

    #[test]
    fn zero_shards_rejected() {
        let err = CacheBuilder::<u32, u32>::new().shards(0).try_build().unwrap_err();
        assert_eq!(err.message(), "shard count must be > 0");
        assert!(CacheBuilder::<u32, u32>::new()
            .shards(0)
            .try_build_async()
            .is_err());

        let store = CacheBuilder::<u32, u32>::new().shards(0).build_store();
        assert_eq!(store.shard_count(), 1);
    }

    #[test]
    fn stats_disabled_by_default() {
        let cache = CacheBuilder::<u32, u32>::new().build();
        cache.put(1, 1);
        assert_eq!(cache.get_if_present(&1), Some(1));
        assert!(!cache.cache().is_recording_stats());
        assert_eq!(cache.stats().hit_count, 0);
    }

    #[test]
    fn config_round_trip() {
        let config = CacheConfig {
            initial_capacity: 64,
            shards: 2,
            record_stats: true,
        };
        let builder = CacheBuilder::<u32, u32>::from_config(config);
        assert_eq!(*builder.config(), config);
        let store = builder.build_store();
        assert_eq!(store.shard_count(), 2);
        assert!(store.is_recording_stats());
    }

    #[test]
    fn custom_ticker_used_for_loads() {
        let ticker = Arc::new(FakeTicker::new());
        ticker.set_auto_increment(std::time::Duration::from_nanos(5));
        let cache = CacheBuilder::<u32, u32>::new()
            .record_stats(true)
            .ticker(ticker)
            .build_loading(loader_fn(|key: &u32| Ok(Some(*key))));
        assert_eq!(cache.get(&3).unwrap(), Some(3));
        assert_eq!(cache.stats().total_load_time, 5);
    }

    #[test]
    fn listener_and_executor_wired() {
        let removed = Arc::new(Mutex::new(Vec::new()));
        let sink = removed.clone();
        let cache = CacheBuilder::<u32, u32>::new()
            .executor(Arc::new(SameThreadExecutor))
            .removal_listener(Arc::new(move |key: &u32, value: &u32, cause: RemovalCause| {
                sink.lock().push((*key, *value, cause));
            }))
            .build();
        cache.put(1, 1);
        cache.put(1, 2);
        cache.invalidate(&1);
        assert_eq!(
            *removed.lock(),
            vec![(1, 1, RemovalCause::Replaced), (1, 2, RemovalCause::Explicit)]
        );
    }

    #[test]
    fn async_listener_skips_unfinished() {
        let removed = Arc::new(Mutex::new(Vec::new()));
        let sink = removed.clone();
        let cache = CacheBuilder::<u32, u32>::new()
            .executor(Arc::new(SameThreadExecutor))
            .removal_listener(Arc::new(move |key: &u32, value: &u32, _: RemovalCause| {
                sink.lock().push((*key, *value));
            }))
            .build_async();
        cache.put(1, Pending::new());
        cache.put(2, Pending::completed(20));
        cache.invalidate_all();
        assert_eq!(*removed.lock(), vec![(2, 20)]);
        assert!(cache.as_map().is_empty());
    }
}
