//! Backing stores for the cache facades.
//!
//! Stores own the key/value (or key/computation) mapping and its atomic
//! primitives; the facades in [`crate::cache`] only ever mutate entries
//! through them.

pub mod hashmap;
pub mod traits;

pub use hashmap::ShardedHashMapStore;
pub use traits::LocalCache;
