//! Concrete caches built on a [`LocalCache`](crate::store::LocalCache) store.
//!
//! | Type                | Store values  | Populated by                         |
//! |---------------------|---------------|--------------------------------------|
//! | `LocalManualCache`  | `V`           | `put`, `get_with`                    |
//! | `LocalLoadingCache` | `V`           | a [`CacheLoader`](crate::loader::CacheLoader) |
//! | `LocalAsyncCache`   | `Pending<V>`  | `put`, `get` (computed on executor)  |
//!
//! Use [`CacheBuilder`](crate::builder::CacheBuilder) to construct them.

pub mod async_cache;
pub mod loading;
pub mod manual;

pub use async_cache::LocalAsyncCache;
pub use loading::LocalLoadingCache;
pub use manual::LocalManualCache;
