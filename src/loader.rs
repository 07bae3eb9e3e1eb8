//! Value loaders for [`LoadingCache`](crate::traits::LoadingCache).
//!
//! A [`CacheLoader`] computes the value for a missing key. Loaders may
//! additionally compute many keys in one call ([`load_all`]) and recompute an
//! existing value during a refresh ([`reload`]).
//!
//! Bulk capability is declared, not detected: a loader that overrides
//! [`load_all`] must also return `true` from [`has_bulk_load`]. The loading
//! cache reads that flag once, when it is constructed.
//!
//! ## Example Usage
//!
//! ```
//! use std::collections::HashMap;
//!
//! use loadkit::error::LoadResult;
//! use loadkit::loader::{loader_fn, CacheLoader};
//!
//! struct Squares;
//!
//! impl CacheLoader<u64, u64> for Squares {
//!     fn load(&self, key: &u64) -> LoadResult<Option<u64>> {
//!         Ok(Some(key * key))
//!     }
//!
//!     fn load_all(&self, keys: &[u64]) -> LoadResult<HashMap<u64, u64>> {
//!         Ok(keys.iter().map(|k| (*k, k * k)).collect())
//!     }
//!
//!     fn has_bulk_load(&self) -> bool {
//!         true
//!     }
//! }
//!
//! assert_eq!(Squares.load(&3).unwrap(), Some(9));
//! assert_eq!(Squares.load_all(&[2, 4]).unwrap().len(), 2);
//!
//! let doubled = loader_fn(|key: &u64| Ok(Some(key * 2)));
//! assert_eq!(doubled.load(&5).unwrap(), Some(10));
//! assert!(!doubled.has_bulk_load());
//! ```
//!
//! [`load_all`]: CacheLoader::load_all
//! [`reload`]: CacheLoader::reload
//! [`has_bulk_load`]: CacheLoader::has_bulk_load

use std::collections::HashMap;
use std::fmt;

use crate::error::{CacheError, LoadResult};

/// Computes values for a loading cache.
pub trait CacheLoader<K, V>: Send + Sync {
    /// Computes the value for `key`. `Ok(None)` means the key has no value
    /// and nothing is cached.
    fn load(&self, key: &K) -> LoadResult<Option<V>>;

    /// Computes values for `keys` in one call.
    ///
    /// The returned map may contain keys that were not requested; they are
    /// cached but not returned to the caller. Requested keys missing from the
    /// result are treated as having no value.
    fn load_all(&self, keys: &[K]) -> LoadResult<HashMap<K, V>> {
        let _ = keys;
        Err(CacheError::Unsupported("load_all"))
    }

    /// Recomputes the value for `key` during a refresh, given the value
    /// currently cached. Defaults to [`load`](Self::load).
    fn reload(&self, key: &K, old_value: &V) -> LoadResult<Option<V>> {
        let _ = old_value;
        self.load(key)
    }

    /// Returns `true` if [`load_all`](Self::load_all) is implemented.
    fn has_bulk_load(&self) -> bool {
        false
    }
}

/// Single-key loader backed by a closure. See [`loader_fn`].
pub struct FnLoader<F> {
    f: F,
}

/// Creates a loader that computes each key with `f`.
pub fn loader_fn<K, V, F>(f: F) -> FnLoader<F>
where
    F: Fn(&K) -> LoadResult<Option<V>> + Send + Sync,
{
    FnLoader { f }
}

impl<K, V, F> CacheLoader<K, V> for FnLoader<F>
where
    F: Fn(&K) -> LoadResult<Option<V>> + Send + Sync,
{
    fn load(&self, key: &K) -> LoadResult<Option<V>> {
        (self.f)(key)
    }
}

impl<F> fmt::Debug for FnLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLoader").finish_non_exhaustive()
    }
}
