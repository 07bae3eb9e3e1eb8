//! Synchronous map view over a store of pending computations.
//!
//! ## Architecture
//!
//! ```text
//!   caller ──► AsyncValueView<K, V, C> ─────────► C: LocalCache<K, Pending<V>>
//!                 │  ConcurrentMap<K, V>             one atomic primitive
//!                 │                                  per operation
//!                 └── outcome helpers decide what a Pending reads as:
//!                       get_if_ready         (non-blocking peek)
//!                       get_when_successful  (waits; failure → None)
//! ```
//!
//! A computation that is in flight, failed, or cancelled is indistinguishable
//! from an absent key to readers. `len`, `is_empty`, `contains_key`, `keys`,
//! and `clear` look only at which keys hold a computation, not at outcomes.
//!
//! ## Consistency
//!
//! Each mutating operation is exactly one atomic step against the store.
//! `remove_value` and `replace_value` first peek at the current computation
//! and then compare-and-swap on that computation's identity: if the entry
//! changes in between, the swap misses and the call returns `false`. They can
//! fail spuriously under contention but never remove or replace a different
//! computation. `contains_value` and the iterators peek entry by entry over a
//! snapshot and are weakly consistent.
//!
//! ## Blocking
//!
//! Operations that report a previous value (`put`, `put_if_absent`,
//! `remove`, `replace`, the compute family) wait for that computation to
//! finish. `compute_if_present`, `compute`, and `merge` do that waiting
//! before they claim the key in the store, so the key is not held while an
//! earlier computation is still running. `get`, `contains_value`, and
//! iteration never block.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use loadkit::map::ConcurrentMap;
//! use loadkit::pending::Pending;
//! use loadkit::store::ShardedHashMapStore;
//! use loadkit::view::AsyncValueView;
//!
//! let store: Arc<ShardedHashMapStore<&str, Pending<u32>>> = Arc::new(ShardedHashMapStore::new(4));
//! let view = AsyncValueView::new(store.clone());
//!
//! let in_flight = Pending::new();
//! store.put("slow", in_flight.clone());
//! view.put("fast", 1);
//!
//! assert_eq!(view.get(&"slow"), None);
//! assert_eq!(view.get(&"fast"), Some(1));
//! assert_eq!(view.len(), 2);
//!
//! in_flight.complete(2);
//! assert_eq!(view.get(&"slow"), Some(2));
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::vec;

use crate::entry::WriteThroughEntry;
use crate::error::LoadResult;
use crate::map::ConcurrentMap;
use crate::outcome;
use crate::pending::Pending;
use crate::store::LocalCache;

/// Realized-value map over a store whose values are [`Pending`] computations.
pub struct AsyncValueView<K, V, C> {
    delegate: Arc<C>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, C> AsyncValueView<K, V, C>
where
    K: Clone,
    V: Clone + Send + Sync + 'static,
    C: LocalCache<K, Pending<V>>,
{
    /// Wraps `delegate`; the view holds no other state.
    pub fn new(delegate: Arc<C>) -> Self {
        Self {
            delegate,
            _marker: PhantomData,
        }
    }

    /// The underlying store of computations.
    pub fn delegate(&self) -> &Arc<C> {
        &self.delegate
    }

    /// A view of the successfully computed values.
    pub fn values_view(&self) -> Values<'_, K, V, C> {
        Values { view: self }
    }

    /// A view of the successfully computed entries.
    pub fn entry_set(&self) -> EntrySet<'_, K, V, C> {
        EntrySet { view: self }
    }

    /// Iterates over successfully computed entries as write-through entries.
    pub fn iter(&self) -> Entries<'_, K, V, C> {
        Entries {
            view: self,
            inner: self.delegate.entries().into_iter(),
        }
    }

    /// Waits for the computation currently at `key` without touching the
    /// store. A remapping that follows then finds it finished, unless a newer
    /// one was installed in between.
    fn await_current(&self, key: &K) {
        if let Some(current) = self.delegate.get(key) {
            let _ = current.wait();
        }
    }
}

impl<K, V, C> ConcurrentMap<K, V> for AsyncValueView<K, V, C>
where
    K: Clone,
    V: Clone + Send + Sync + 'static,
    C: LocalCache<K, Pending<V>>,
{
    fn len(&self) -> usize {
        self.delegate.len()
    }

    fn is_empty(&self) -> bool {
        self.delegate.is_empty()
    }

    fn contains_key(&self, key: &K) -> bool {
        self.delegate.contains_key(key)
    }

    fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values_view().iter().any(|ready| ready == *value)
    }

    fn get(&self, key: &K) -> Option<V> {
        outcome::get_if_ready(self.delegate.get(key).as_ref())
    }

    fn put(&self, key: K, value: V) -> Option<V> {
        let previous = self.delegate.put(key, Pending::completed(value));
        outcome::get_when_successful(previous.as_ref())
    }

    fn put_if_absent(&self, key: K, value: V) -> Option<V> {
        let existing = self.delegate.put_if_absent(key, Pending::completed(value));
        outcome::get_when_successful(existing.as_ref())
    }

    fn remove(&self, key: &K) -> Option<V> {
        outcome::get_when_successful(self.delegate.remove(key).as_ref())
    }

    fn remove_value(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        let Some(current) = self.delegate.get(key) else {
            return false;
        };
        if outcome::get_if_ready(Some(&current)).as_ref() != Some(value) {
            return false;
        }
        self.delegate.remove_value(key, &current)
    }

    fn replace(&self, key: K, value: V) -> Option<V> {
        let previous = self.delegate.replace(key, Pending::completed(value));
        outcome::get_when_successful(previous.as_ref())
    }

    fn replace_value(&self, key: K, old: &V, new: V) -> bool
    where
        V: PartialEq,
    {
        let Some(current) = self.delegate.get(&key) else {
            return false;
        };
        if outcome::get_if_ready(Some(&current)).as_ref() != Some(old) {
            return false;
        }
        self.delegate
            .replace_value(key, &current, Pending::completed(new))
    }

    fn clear(&self) {
        self.delegate.clear();
    }

    fn keys(&self) -> Vec<K> {
        self.delegate.keys()
    }

    fn values(&self) -> Vec<V> {
        self.values_view().iter().collect()
    }

    fn entries(&self) -> Vec<(K, V)> {
        self.iter().map(WriteThroughEntry::into_pair).collect()
    }

    fn compute_if_absent<F>(&self, key: K, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&K) -> LoadResult<Option<V>>,
    {
        let pending = self
            .delegate
            .compute_if_absent(key, |k| Ok(f(k)?.map(Pending::completed)))?;
        Ok(outcome::get_when_successful(pending.as_ref()))
    }

    fn compute_if_present<F>(&self, key: K, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&K, &V) -> LoadResult<Option<V>>,
    {
        self.await_current(&key);
        let pending = self.delegate.compute_if_present(key, |k, old_pending| {
            let Some(old) = outcome::get_when_successful(Some(old_pending)) else {
                return Ok(None);
            };
            Ok(f(k, &old)?.map(Pending::completed))
        })?;
        Ok(outcome::get_when_successful(pending.as_ref()))
    }

    /// Remaps unconditionally, recording a load success or failure.
    ///
    /// This is the one view operation that emits statistics: it is the
    /// substrate for asynchronous loads and refreshes.
    fn compute<F>(&self, key: K, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&K, Option<&V>) -> LoadResult<Option<V>>,
    {
        self.await_current(&key);
        let stats = self.delegate.stats_counter();
        let ticker = self.delegate.ticker();
        let start = ticker.read();
        let pending = self.delegate.compute_with(
            key,
            |k, old_pending| {
                let old = outcome::get_when_successful(old_pending);
                let remapped = f(k, old.as_ref());
                let load_time = ticker.read().saturating_sub(start);
                match &remapped {
                    Ok(Some(_)) => stats.record_load_success(load_time),
                    _ => stats.record_load_failure(load_time),
                }
                Ok(remapped?.map(Pending::completed))
            },
            false,
            true,
        )?;
        Ok(outcome::get_when_successful(pending.as_ref()))
    }

    /// Merges with the current value; a failed computation is superseded by
    /// `value` outright.
    fn merge<F>(&self, key: K, value: V, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&V, &V) -> LoadResult<Option<V>>,
    {
        self.await_current(&key);
        let candidate = Pending::completed(value.clone());
        let merged = self
            .delegate
            .merge(key, candidate, |old_pending, candidate| {
                match outcome::get_when_successful(Some(old_pending)) {
                    Some(old) => Ok(f(&old, &value)?.map(Pending::completed)),
                    None => Ok(Some(candidate.clone())),
                }
            })?;
        Ok(outcome::get_when_successful(merged.as_ref()))
    }
}

impl<'a, K, V, C> IntoIterator for &'a AsyncValueView<K, V, C>
where
    K: Clone,
    V: Clone + Send + Sync + 'static,
    C: LocalCache<K, Pending<V>>,
{
    type Item = WriteThroughEntry<'a, K, V, AsyncValueView<K, V, C>>;
    type IntoIter = Entries<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, C: fmt::Debug> fmt::Debug for AsyncValueView<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncValueView")
            .field("delegate", &self.delegate)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Collection view of the successfully computed values.
pub struct Values<'a, K, V, C> {
    view: &'a AsyncValueView<K, V, C>,
}

impl<K, V, C> Values<'_, K, V, C>
where
    K: Clone,
    V: Clone + Send + Sync + 'static,
    C: LocalCache<K, Pending<V>>,
{
    /// Number of keys holding a computation, finished or not.
    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    pub fn contains(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.view.contains_value(value)
    }

    pub fn clear(&self) {
        self.view.clear();
    }

    pub fn iter(&self) -> ValuesIter<V> {
        ValuesIter {
            inner: self.view.delegate.values().into_iter(),
        }
    }
}

/// Iterator over values that had completed successfully when reached.
pub struct ValuesIter<V> {
    inner: vec::IntoIter<Pending<V>>,
}

impl<V: Clone> Iterator for ValuesIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        self.inner
            .by_ref()
            .find_map(|pending| outcome::get_if_ready(Some(&pending)))
    }
}

// ---------------------------------------------------------------------------
// EntrySet
// ---------------------------------------------------------------------------

/// Set view of the successfully computed entries.
pub struct EntrySet<'a, K, V, C> {
    view: &'a AsyncValueView<K, V, C>,
}

impl<'a, K, V, C> EntrySet<'a, K, V, C>
where
    K: Clone,
    V: Clone + Send + Sync + 'static,
    C: LocalCache<K, Pending<V>>,
{
    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Returns `true` if `key` currently maps to a ready `value`.
    pub fn contains(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.view.get(key).as_ref() == Some(value)
    }

    /// Adds the mapping if `key` is absent; returns whether it was added.
    pub fn insert(&self, key: K, value: V) -> bool {
        self.view.put_if_absent(key, value).is_none()
    }

    /// Removes the mapping if `key` currently maps to `value`.
    pub fn remove(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.view.remove_value(key, value)
    }

    pub fn clear(&self) {
        self.view.clear();
    }

    pub fn iter(&self) -> Entries<'a, K, V, C> {
        self.view.iter()
    }
}

/// Iterator over entries that had completed successfully when reached.
pub struct Entries<'a, K, V, C> {
    view: &'a AsyncValueView<K, V, C>,
    inner: vec::IntoIter<(K, Pending<V>)>,
}

impl<'a, K, V, C> Iterator for Entries<'a, K, V, C>
where
    K: Clone,
    V: Clone + Send + Sync + 'static,
    C: LocalCache<K, Pending<V>>,
{
    type Item = WriteThroughEntry<'a, K, V, AsyncValueView<K, V, C>>;

    fn next(&mut self) -> Option<Self::Item> {
        let view = self.view;
        self.inner.by_ref().find_map(|(key, pending)| {
            outcome::get_if_ready(Some(&pending)).map(|value| WriteThroughEntry::new(view, key, value))
        })
    }
}
