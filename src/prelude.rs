pub use crate::builder::{CacheBuilder, CacheConfig};
pub use crate::cache::{LocalAsyncCache, LocalLoadingCache, LocalManualCache};
pub use crate::entry::WriteThroughEntry;
pub use crate::error::{CacheError, ConfigError, LoadResult};
pub use crate::executor::{Executor, RayonExecutor, SameThreadExecutor, ThreadExecutor};
pub use crate::listener::{RemovalCause, RemovalListener};
pub use crate::loader::{loader_fn, CacheLoader};
pub use crate::map::ConcurrentMap;
pub use crate::pending::Pending;
pub use crate::stats::{CacheStats, StatsCounter};
pub use crate::store::{LocalCache, ShardedHashMapStore};
pub use crate::time::{FakeTicker, SystemTicker, Ticker};
pub use crate::traits::{Cache, LoadingCache};
pub use crate::view::AsyncValueView;
