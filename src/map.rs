//! Synchronous concurrent mapping interface.
//!
//! [`ConcurrentMap`] is the map-like surface shared by the backing store
//! ([`LocalCache`](crate::store::LocalCache)) and the async value view
//! ([`AsyncValueView`](crate::view::AsyncValueView)). Every mutating method is
//! a single atomic step against the implementation: no other writer can
//! interleave between a condition check and the mutation it guards.
//!
//! ## Operation Summary
//!
//! | Method               | Mutates when                         | Returns                  |
//! |----------------------|--------------------------------------|--------------------------|
//! | `put`                | always                               | previous value           |
//! | `put_if_absent`      | key absent                           | existing value           |
//! | `remove`             | key present                          | removed value            |
//! | `remove_value`       | current value equals argument        | whether it removed       |
//! | `replace`            | key present                          | previous value           |
//! | `replace_value`      | current value equals `old`           | whether it replaced      |
//! | `compute_if_absent`  | key absent and fn yields `Some`      | current value            |
//! | `compute_if_present` | key present                          | new value                |
//! | `compute`            | always (`None` removes)              | new value                |
//! | `merge`              | always (`None` removes)              | new value                |
//!
//! A remapping closure holds its key for the duration of the call: other
//! writers to that key wait, readers see the value from before the call, and
//! other keys are unaffected. A closure may read the map but must not write
//! its own key.
//!
//! `keys`, `values`, and `entries` return weakly consistent snapshots: they
//! never fail under concurrent modification and may or may not reflect
//! writes that race with them.

use crate::error::LoadResult;

/// A thread-safe map with atomic conditional and remapping operations.
pub trait ConcurrentMap<K, V>: Send + Sync {
    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_key(&self, key: &K) -> bool;

    /// Returns `true` if some entry currently maps to `value`.
    fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq;

    fn get(&self, key: &K) -> Option<V>;

    /// Associates `value` with `key`, returning the previous value.
    fn put(&self, key: K, value: V) -> Option<V>;

    fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        Self: Sized,
    {
        for (key, value) in entries {
            self.put(key, value);
        }
    }

    /// Inserts only if `key` is absent; returns the value already present.
    fn put_if_absent(&self, key: K, value: V) -> Option<V>;

    fn remove(&self, key: &K) -> Option<V>;

    /// Removes the entry only if it currently maps to `value`.
    fn remove_value(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq;

    /// Replaces the value only if `key` is present; returns the previous value.
    fn replace(&self, key: K, value: V) -> Option<V>;

    /// Replaces the value only if it currently equals `old`.
    fn replace_value(&self, key: K, old: &V, new: V) -> bool
    where
        V: PartialEq;

    fn clear(&self);

    fn keys(&self) -> Vec<K>;

    fn values(&self) -> Vec<V>;

    fn entries(&self) -> Vec<(K, V)>;

    /// Computes and inserts a value if `key` is absent. An `Ok(None)` from `f`
    /// inserts nothing. Returns the present or newly computed value.
    fn compute_if_absent<F>(&self, key: K, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&K) -> LoadResult<Option<V>>,
        Self: Sized;

    /// Remaps the value if `key` is present; `Ok(None)` removes the entry.
    fn compute_if_present<F>(&self, key: K, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&K, &V) -> LoadResult<Option<V>>,
        Self: Sized;

    /// Remaps the value whether or not `key` is present; `Ok(None)` removes
    /// the entry (or leaves it absent).
    fn compute<F>(&self, key: K, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&K, Option<&V>) -> LoadResult<Option<V>>,
        Self: Sized;

    /// Inserts `value` if absent, else combines with `f(old, value)`;
    /// `Ok(None)` removes the entry.
    fn merge<F>(&self, key: K, value: V, f: F) -> LoadResult<Option<V>>
    where
        F: FnOnce(&V, &V) -> LoadResult<Option<V>>,
        Self: Sized;
}
