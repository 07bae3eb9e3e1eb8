//! Key/value views whose updates write through to the owning map.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

use crate::map::ConcurrentMap;

/// A snapshot of one mapping, produced by entry iteration.
///
/// [`set_value`](Self::set_value) writes the new value to the owning map and
/// then updates the local snapshot. Equality and hashing consider only the key
/// and value, so entries taken from different iterations compare equal when
/// their contents match.
pub struct WriteThroughEntry<'a, K, V, M: ?Sized> {
    map: &'a M,
    key: K,
    value: V,
}

impl<'a, K, V, M> WriteThroughEntry<'a, K, V, M>
where
    K: Clone,
    V: Clone,
    M: ConcurrentMap<K, V> + ?Sized,
{
    /// Snapshot of `key` and `value` that writes back to `map`.
    pub fn new(map: &'a M, key: K, value: V) -> Self {
        Self { map, key, value }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    /// The value as of when this entry was produced or last set.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Puts `value` into the owning map and returns the previous snapshot.
    pub fn set_value(&mut self, value: V) -> V {
        self.map.put(self.key.clone(), value.clone());
        mem::replace(&mut self.value, value)
    }

    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: PartialEq, V: PartialEq, M: ?Sized> PartialEq for WriteThroughEntry<'_, K, V, M> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl<K: Eq, V: Eq, M: ?Sized> Eq for WriteThroughEntry<'_, K, V, M> {}

impl<K: Hash, V: Hash, M: ?Sized> Hash for WriteThroughEntry<'_, K, V, M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.value.hash(state);
    }
}

impl<K: fmt::Debug, V: fmt::Debug, M: ?Sized> fmt::Debug for WriteThroughEntry<'_, K, V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}={:?}", self.key, self.value)
    }
}
