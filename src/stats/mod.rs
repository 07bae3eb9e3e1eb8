//! # Cache Statistics
//!
//! Recording and snapshotting are split so the cache core only ever
//! *records*:
//!
//! ```text
//!   ┌──────────────────────────────┐
//!   │        StatsCounter          │  record_hits / record_misses
//!   │   (atomic increments only)   │  record_load_success / _failure
//!   └──────────────┬───────────────┘
//!                  │ snapshot()
//!                  ▼
//!   ┌──────────────────────────────┐
//!   │         CacheStats           │
//!   │  immutable, derived rates    │
//!   └──────────────────────────────┘
//! ```
//!
//! Counters are never read-modify-written by callers; a statistics update and
//! the map update it describes are not atomic with respect to each other.

pub mod counter;
pub mod snapshot;

pub use counter::{ConcurrentStatsCounter, DisabledStatsCounter};
pub use snapshot::CacheStats;

/// Accumulates cache statistics.
///
/// Implementations must be safe to call from any thread without external
/// synchronization. Load times are in nanoseconds as read from the cache's
/// [`Ticker`](crate::time::Ticker).
pub trait StatsCounter: Send + Sync {
    /// Records `count` cache hits.
    fn record_hits(&self, count: u64);

    /// Records `count` cache misses.
    fn record_misses(&self, count: u64);

    /// Records a successful load that took `load_time` nanoseconds.
    fn record_load_success(&self, load_time: u64);

    /// Records a failed (or absent) load that took `load_time` nanoseconds.
    fn record_load_failure(&self, load_time: u64);

    /// Returns a point-in-time snapshot of the counters.
    fn snapshot(&self) -> CacheStats;
}
