//! The backing store capability.
//!
//! A [`LocalCache`] is a [`ConcurrentMap`] plus the auxiliary capabilities the
//! cache facades build on: statistics-aware lookups and loads, a time source,
//! an executor for detached work, and removal notifications. It may hold
//! realized values directly (synchronous caches) or [`Pending`] computations
//! (asynchronous caches, read through [`AsyncValueView`]).
//!
//! [`Pending`]: crate::pending::Pending
//! [`AsyncValueView`]: crate::view::AsyncValueView

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::LoadResult;
use crate::executor::Executor;
use crate::listener::RemovalListener;
use crate::map::ConcurrentMap;
use crate::stats::StatsCounter;
use crate::time::Ticker;

/// Storage capability consumed by the cache facades.
pub trait LocalCache<K, V>: ConcurrentMap<K, V> {
    /// Number of entries as a `u64`; may be an estimate under concurrency.
    fn mapping_count(&self) -> u64 {
        self.len() as u64
    }

    /// [`compute`](ConcurrentMap::compute) with explicit statistics modes.
    ///
    /// When `is_async` is `false` the store times `f` and records a load
    /// success (`Ok(Some)`) or failure (`Ok(None)` or `Err`), preceded by a
    /// miss if `record_miss` is set. When `is_async` is `true` the value is
    /// itself asynchronous and the caller owns all accounting.
    fn compute_with<F>(
        &self,
        key: K,
        f: F,
        record_miss: bool,
        is_async: bool,
    ) -> LoadResult<Option<V>>
    where
        F: FnOnce(&K, Option<&V>) -> LoadResult<Option<V>>,
        Self: Sized;

    /// Performs any pending maintenance work.
    fn clean_up(&self);

    /// Looks up `key`, recording a hit or miss when `record_stats` is set.
    fn get_if_present(&self, key: &K, record_stats: bool) -> Option<V>;

    /// Returns the entries present for `keys`, recording hits and misses.
    fn get_all_present(&self, keys: &[K]) -> HashMap<K, V>;

    fn removal_listener(&self) -> Option<&Arc<dyn RemovalListener<K, V>>>;

    fn stats_counter(&self) -> &Arc<dyn StatsCounter>;

    fn is_recording_stats(&self) -> bool;

    fn ticker(&self) -> &Arc<dyn Ticker>;

    fn executor(&self) -> &Arc<dyn Executor>;
}
