//! HashMap-backed store implementation.
//!
//! ## Architecture
//! - Entries live in `HashMap<K, Slot<V>, S>` shards, each behind a
//!   `parking_lot` `RwLock`; the shard is chosen with the configured hasher.
//! - A slot is either a ready value or a key *claimed* by an in-flight
//!   remapping. The compute family claims the key under the shard lock,
//!   releases the lock, runs its closure, and settles the claim under the
//!   lock again. Shard locks are only ever held for map bookkeeping.
//! - Readers of a claimed key see the value it held when claimed. Writers to
//!   a claimed key wait for the claim to settle, so each operation is still
//!   one atomic step with respect to its key. Other keys are unaffected.
//! - Removal notifications are collected under the lock and dispatched on the
//!   executor after it is released.
//!
//! ```text
//!   compute(k, f)
//!     ├─ write lock ─► slot = Computing { prior, latch } ─► unlock
//!     ├─ f(k, prior)                 (get(k) → prior, put(k) waits on latch)
//!     └─ write lock ─► slot = Ready(v) | removed ─► unlock ─► latch released
//! ```
//!
//! ## Core Operations
//! - `put` / `put_if_absent` / `replace` / `replace_value`: insert or update.
//! - `get` / `get_if_present`: lookup (the latter optionally records stats).
//! - `remove` / `remove_value` / `clear`: delete.
//! - `compute_if_absent` / `compute_with`: stats-aware loading primitives.
//!
//! ## Statistics
//! - `get` and `contains_key` never record.
//! - `get_if_present(key, true)` records a hit or miss.
//! - `compute_if_absent` records a hit, or a miss plus a load result.
//! - `compute_with(.., is_async = false)` records the load result (and a miss
//!   if asked to); `is_async = true` leaves accounting to the caller.
//!
//! ## Example Usage
//! ```rust
//! use loadkit::map::ConcurrentMap;
//! use loadkit::store::ShardedHashMapStore;
//!
//! let store: ShardedHashMapStore<u64, String> = ShardedHashMapStore::new(4);
//! store.put(1, "a".to_string());
//! assert_eq!(store.get(&1), Some("a".to_string()));
//! assert_eq!(store.put_if_absent(1, "b".to_string()), Some("a".to_string()));
//! ```
//!
//! ## Thread Safety
//! - `ShardedHashMapStore` is `Send + Sync`.
//! - Reads never wait for a remapping closure.
//! - A remapping closure may read any key, but must not write its own key.
//! - `clear` does not wait for claimed keys: it drops their prior values and
//!   the in-flight remapping settles afterwards.
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};
use rustc_hash::FxHashSet;

use crate::error::LoadResult;
use crate::executor::{Executor, RayonExecutor};
use crate::listener::{self, RemovalCause, RemovalListener};
use crate::map::ConcurrentMap;
use crate::pending::Pending;
use crate::stats::{DisabledStatsCounter, StatsCounter};
use crate::store::traits::LocalCache;
use crate::time::{DisabledTicker, Ticker};

type Removed<K, V> = (K, V, RemovalCause);
type Shard<K, V, S> = HashMap<K, Slot<V>, S>;

enum Slot<V> {
    Ready(V),
    Computing(Claimed<V>),
}

struct Claimed<V> {
    /// Value the key held when claimed, unless cleared since.
    prior: Option<V>,
    /// Released when the claim settles.
    latch: Pending<()>,
}

impl<V> Slot<V> {
    /// The value readers see.
    fn value(&self) -> Option<&V> {
        match self {
            Slot::Ready(value) => Some(value),
            Slot::Computing(claimed) => claimed.prior.as_ref(),
        }
    }

    fn into_value(self) -> Option<V> {
        match self {
            Slot::Ready(value) => Some(value),
            Slot::Computing(claimed) => claimed.prior,
        }
    }
}

/// Concurrent HashMap-backed store with sharded locking.
pub struct ShardedHashMapStore<K, V, S = RandomState> {
    shards: Box<[RwLock<Shard<K, V, S>>]>,
    /// Keys with a readable value; a claimed key without a prior is not one.
    size: AtomicUsize,
    hasher: S,
    stats: Arc<dyn StatsCounter>,
    recording_stats: bool,
    ticker: Arc<dyn Ticker>,
    executor: Arc<dyn Executor>,
    listener: Option<Arc<dyn RemovalListener<K, V>>>,
}

impl<K, V> ShardedHashMapStore<K, V, RandomState>
where
    K: Eq + Hash,
{
    /// Create a sharded store with the default hasher.
    pub fn new(shards: usize) -> Self {
        Self::with_hasher(0, shards, RandomState::new())
    }
}

impl<K, V, S> ShardedHashMapStore<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    /// Create a sharded store with a custom hasher.
    ///
    /// `initial_capacity` is spread across shards. The shard count is clamped
    /// to at least 1.
    pub fn with_hasher(initial_capacity: usize, shards: usize, hasher: S) -> Self {
        let shard_count = shards.max(1);
        let per_shard = initial_capacity.div_ceil(shard_count);
        let shards = (0..shard_count)
            .map(|_| RwLock::new(HashMap::with_capacity_and_hasher(per_shard, hasher.clone())))
            .collect();
        Self {
            shards,
            size: AtomicUsize::new(0),
            hasher,
            stats: Arc::new(DisabledStatsCounter),
            recording_stats: false,
            ticker: Arc::new(DisabledTicker),
            executor: Arc::new(RayonExecutor),
            listener: None,
        }
    }

    /// Record statistics into `counter`, timing loads with `ticker`.
    pub fn with_stats(mut self, counter: Arc<dyn StatsCounter>, ticker: Arc<dyn Ticker>) -> Self {
        self.stats = counter;
        self.ticker = ticker;
        self.recording_stats = true;
        self
    }

    /// Run detached work (removal notifications) on `executor`.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    /// Report removed and replaced entries to `listener`.
    pub fn with_removal_listener(mut self, listener: Arc<dyn RemovalListener<K, V>>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Return the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Compute the shard for a key.
    fn shard(&self, key: &K) -> &RwLock<Shard<K, V, S>> {
        let idx = (self.hasher.hash_one(key) as usize) % self.shards.len();
        &self.shards[idx]
    }

    /// Write-locks the shard of `key` once no remapping holds the key.
    fn lock_settled(&self, key: &K) -> RwLockWriteGuard<'_, Shard<K, V, S>> {
        let lock = self.shard(key);
        loop {
            let shard = lock.write();
            let latch = match shard.get(key) {
                Some(Slot::Computing(claimed)) => Some(claimed.latch.clone()),
                _ => None,
            };
            let Some(latch) = latch else {
                return shard;
            };
            drop(shard);
            let _ = latch.wait();
        }
    }
}

impl<K, V, S> ShardedHashMapStore<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: BuildHasher + Clone + Send + Sync,
{
    /// Runs `load`, recording its latency and outcome.
    fn record_load<T>(
        &self,
        record_miss: bool,
        load: impl FnOnce() -> LoadResult<Option<T>>,
    ) -> LoadResult<Option<T>> {
        if record_miss {
            self.stats.record_misses(1);
        }
        let start = self.ticker.read();
        let result = load();
        let load_time = self.ticker.read().saturating_sub(start);
        match &result {
            Ok(Some(_)) => self.stats.record_load_success(load_time),
            _ => self.stats.record_load_failure(load_time),
        }
        result
    }

    /// Claims `key` for a remapping if `wanted` accepts its current value,
    /// waiting out any claim already held. Otherwise returns that value.
    fn claim(
        &self,
        key: K,
        wanted: impl FnOnce(Option<&V>) -> bool,
    ) -> Result<Claim<'_, K, V, S>, Option<V>> {
        let mut shard = self.lock_settled(&key);
        let prior = shard.get(&key).and_then(Slot::value).cloned();
        if !wanted(prior.as_ref()) {
            return Err(prior);
        }
        let latch = Pending::new();
        shard.insert(
            key.clone(),
            Slot::Computing(Claimed {
                prior: prior.clone(),
                latch: latch.clone(),
            }),
        );
        drop(shard);
        Ok(Claim {
            store: self,
            key,
            prior,
            latch,
            settled: false,
        })
    }

    fn dispatch(&self, removed: Option<Removed<K, V>>) {
        if let (Some(listener), Some((key, value, cause))) = (&self.listener, removed) {
            listener::notify(listener, self.executor.as_ref(), key, value, cause);
        }
    }
}

/// Exclusive right to remap one key while the shard lock is released.
///
/// Dropping an unsettled claim (the closure failed or panicked) puts back the
/// value the key held.
struct Claim<'a, K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: BuildHasher + Clone + Send + Sync,
{
    store: &'a ShardedHashMapStore<K, V, S>,
    key: K,
    prior: Option<V>,
    latch: Pending<()>,
    settled: bool,
}

impl<K, V, S> Claim<'_, K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: BuildHasher + Clone + Send + Sync,
{
    fn prior(&self) -> Option<&V> {
        self.prior.as_ref()
    }

    /// Stores `remapped`, or removes the key for `None`, and releases it.
    fn commit(mut self, remapped: Option<V>) -> Option<V> {
        let removed = self.settle(Some(remapped.clone()));
        self.store.dispatch(removed);
        remapped
    }

    /// `None` abandons the claim and restores the prior value.
    fn settle(&mut self, remapped: Option<Option<V>>) -> Option<Removed<K, V>> {
        self.settled = true;
        let removed = {
            let mut shard = self.store.shard(&self.key).write();
            let prior = match shard.get_mut(&self.key) {
                Some(Slot::Computing(claimed)) if claimed.latch.ptr_eq(&self.latch) => {
                    Some(claimed.prior.take())
                },
                _ => None,
            };
            match prior {
                Some(prior) => {
                    let had_value = prior.is_some();
                    let (next, removed) = match remapped {
                        None => (prior, None),
                        Some(Some(value)) => (
                            Some(value),
                            prior.map(|old| (self.key.clone(), old, RemovalCause::Replaced)),
                        ),
                        Some(None) => (
                            None,
                            prior.map(|old| (self.key.clone(), old, RemovalCause::Explicit)),
                        ),
                    };
                    match (had_value, next.is_some()) {
                        (false, true) => {
                            self.store.size.fetch_add(1, Ordering::Relaxed);
                        },
                        (true, false) => {
                            self.store.size.fetch_sub(1, Ordering::Relaxed);
                        },
                        _ => {},
                    }
                    match next {
                        Some(value) => {
                            shard.insert(self.key.clone(), Slot::Ready(value));
                        },
                        None => {
                            shard.remove(&self.key);
                        },
                    }
                    removed
                },
                None => None,
            }
        };
        self.latch.complete(());
        removed
    }
}

impl<K, V, S> Drop for Claim<'_, K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: BuildHasher + Clone + Send + Sync,
{
    fn drop(&mut self) {
        if !self.settled {
            self.settle(None);
        }
    }
}

impl<K, V, S> ConcurrentMap<K, V> for ShardedHashMapStore<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: BuildHasher + Clone + Send + Sync,
{
    fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    fn contains_key(&self, key: &K) -> bool {
        self.shard(key).read().get(key).and_then(Slot::value).is_some()
    }

    fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.shards.iter().any(|shard| {
            shard
                .read()
                .values()
                .any(|slot| slot.value() == Some(value))
        })
    }

    fn get(&self, key: &K) -> Option<V> {
        self.shard(key).read().get(key).and_then(Slot::value).cloned()
    }

    fn put(&self, key: K, value: V) -> Option<V> {
        let previous = self
            .lock_settled(&key)
            .insert(key.clone(), Slot::Ready(value))
            .and_then(Slot::into_value);
        match &previous {
            Some(old) => self.dispatch(Some((key, old.clone(), RemovalCause::Replaced))),
            None => {
                self.size.fetch_add(1, Ordering::Relaxed);
            },
        }
        previous
    }

    fn put_if_absent(&self, key: K, value: V) -> Option<V> {
        let mut shard = self.lock_settled(&key);
        if let Some(existing) = shard.get(&key).and_then(Slot::value) {
            return Some(existing.clone());
        }
        shard.insert(key, Slot::Ready(value));
        self.size.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn remove(&self, key: &K) -> Option<V> {
        let removed = self.lock_settled(key).remove_entry(key);
        let (key, slot) = removed?;
        let value = slot.into_value()?;
        self.size.fetch_sub(1, Ordering::Relaxed);
        self.dispatch(Some((key, value.clone(), RemovalCause::Explicit)));
        Some(value)
    }

    fn remove_value(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        let removed = {
            let mut shard = self.lock_settled(key);
            if shard.get(key).and_then(Slot::value) != Some(value) {
                return false;
            }
            shard.remove_entry(key)
        };
        match removed {
            Some((key, slot)) => {
                self.size.fetch_sub(1, Ordering::Relaxed);
                if let Some(old) = slot.into_value() {
                    self.dispatch(Some((key, old, RemovalCause::Explicit)));
                }
                true
            },
            None => false,
        }
    }

    fn replace(&self, key: K, value: V) -> Option<V> {
        let old = {
            let mut shard = self.lock_settled(&key);
            let slot = shard.get_mut(&key)?;
            mem::replace(slot, Slot::Ready(value)).into_value()?
        };
        self.dispatch(Some((key, old.clone(), RemovalCause::Replaced)));
        Some(old)
    }

    fn replace_value(&self, key: K, old: &V, new: V) -> bool
    where
        V: PartialEq,
    {
        let previous = {
            let mut shard = self.lock_settled(&key);
            match shard.get_mut(&key) {
                Some(slot) if slot.value() == Some(old) => mem::replace(slot, Slot::Ready(new)),
                _ => return false,
            }
        };
        if let Some(previous) = previous.into_value() {
            self.dispatch(Some((key, previous, RemovalCause::Replaced)));
        }
        true
    }

    fn clear(&self) {
        for shard in self.shards.iter() {
            let drained: Vec<(K, V)> = {
                let mut guard = shard.write();
                let mut drained = Vec::with_capacity(guard.len());
                let mut claimed = Vec::new();
                for (key, slot) in guard.drain() {
                    match slot {
                        Slot::Ready(value) => drained.push((key, value)),
                        Slot::Computing(mut computing) => {
                            if let Some(prior) = computing.prior.take() {
                                drained.push((key.clone(), prior));
                            }
                            claimed.push((key, Slot::Computing(computing)));
                        },
                    }
                }
                guard.extend(claimed);
                self.size.fetch_sub(drained.len(), Ordering::Relaxed);
                drained
            };
            if self.listener.is_some() {
                for (key, value) in drained {
                    self.dispatch(Some((key, value, RemovalCause::Explicit)));
                }
            }
        }
    }

    fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            let guard = shard.read();
            keys.extend(
                guard
                    .iter()
                    .filter(|(_, slot)| slot.value().is_some())
                    .map(|(k, _)| k.clone()),
            );
        }
        keys
    }

    fn values(&self) -> Vec<V> {
        let mut values = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            values.extend(shard.read().values().filter_map(Slot::value).cloned());
        }
        values
    }

    fn entries(&self) -> Vec<(K, V)> {
        let mut entries = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            let guard = shard.read();
            entries.extend(
                guard
                    .iter()
                    .filter_map(|(k, slot)| Some((k.clone(), slot.value()?.clone()))),
            );
        }
        entries
    }

    fn compute_if_absent<F>(&self, key: K, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&K) -> LoadResult<Option<V>>,
    {
        if let Some(value) = self.get(&key) {
            self.stats.record_hits(1);
            return Ok(Some(value));
        }
        let claim = match self.claim(key, |current| current.is_none()) {
            Ok(claim) => claim,
            Err(existing) => {
                self.stats.record_hits(1);
                return Ok(existing);
            },
        };
        let computed = self.record_load(true, || f(&claim.key))?;
        Ok(claim.commit(computed))
    }

    fn compute_if_present<F>(&self, key: K, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&K, &V) -> LoadResult<Option<V>>,
    {
        let Ok(claim) = self.claim(key, |current| current.is_some()) else {
            return Ok(None);
        };
        let remapped = match claim.prior() {
            Some(old) => f(&claim.key, old)?,
            None => return Ok(None),
        };
        Ok(claim.commit(remapped))
    }

    fn compute<F>(&self, key: K, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&K, Option<&V>) -> LoadResult<Option<V>>,
    {
        self.compute_with(key, f, false, true)
    }

    fn merge<F>(&self, key: K, value: V, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&V, &V) -> LoadResult<Option<V>>,
    {
        let claim = match self.claim(key, |_| true) {
            Ok(claim) => claim,
            Err(current) => return Ok(current),
        };
        let remapped = match claim.prior() {
            Some(old) => f(old, &value)?,
            None => Some(value),
        };
        Ok(claim.commit(remapped))
    }
}

impl<K, V, S> LocalCache<K, V> for ShardedHashMapStore<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: BuildHasher + Clone + Send + Sync,
{
    fn compute_with<F>(
        &self,
        key: K,
        f: F,
        record_miss: bool,
        is_async: bool,
    ) -> LoadResult<Option<V>>
    where
        F: FnOnce(&K, Option<&V>) -> LoadResult<Option<V>>,
    {
        let claim = match self.claim(key, |_| true) {
            Ok(claim) => claim,
            Err(current) => return Ok(current),
        };
        let remapped = if is_async {
            f(&claim.key, claim.prior())?
        } else {
            self.record_load(record_miss, || f(&claim.key, claim.prior()))?
        };
        Ok(claim.commit(remapped))
    }

    fn clean_up(&self) {
        // Unbounded store: no expiration or eviction work is ever deferred.
        tracing::trace!(entries = self.len(), "clean up");
    }

    fn get_if_present(&self, key: &K, record_stats: bool) -> Option<V> {
        let value = self.get(key);
        if record_stats {
            match value {
                Some(_) => self.stats.record_hits(1),
                None => self.stats.record_misses(1),
            }
        }
        value
    }

    fn get_all_present(&self, keys: &[K]) -> HashMap<K, V> {
        let mut seen = FxHashSet::default();
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if !seen.insert(key) {
                continue;
            }
            if let Some(value) = self.get(key) {
                found.insert(key.clone(), value);
            }
        }
        let hits = found.len() as u64;
        self.stats.record_hits(hits);
        self.stats.record_misses(seen.len() as u64 - hits);
        found
    }

    fn removal_listener(&self) -> Option<&Arc<dyn RemovalListener<K, V>>> {
        self.listener.as_ref()
    }

    fn stats_counter(&self) -> &Arc<dyn StatsCounter> {
        &self.stats
    }

    fn is_recording_stats(&self) -> bool {
        self.recording_stats
    }

    fn ticker(&self) -> &Arc<dyn Ticker> {
        &self.ticker
    }

    fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }
}

impl<K, V, S> fmt::Debug for ShardedHashMapStore<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedHashMapStore")
            .field("shards", &self.shards.len())
            .field("len", &self.size.load(Ordering::Relaxed))
            .field("recording_stats", &self.recording_stats)
            .field("has_removal_listener", &self.listener.is_some())
            .finish()
    }
}
