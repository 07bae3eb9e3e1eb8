//! Single-assignment cell for a value that is being produced asynchronously.
//!
//! ## Architecture
//!
//! ```text
//!   Pending<V> ──clone──► Pending<V>          (shared handle, Arc)
//!        │
//!        ▼
//!   ┌───────────────────────────────────────────────┐
//!   │ Cell                                          │
//!   │   outcome: OnceLock<Result<V, CacheError>>    │  lock-free peek
//!   │   waiters: Mutex<()> + Condvar                │  blocking wait
//!   └───────────────────────────────────────────────┘
//!
//!   in-flight ──complete(v)──► Succeeded(v)
//!       │
//!       └──────fail(e)/cancel()──► Failed(e)
//! ```
//!
//! The outcome is written at most once; every later `complete`/`fail`/`cancel`
//! returns `false` and leaves the cell untouched. Reading the outcome never
//! takes a lock, so the outcome helpers in [`crate::outcome`] can peek without
//! blocking.
//!
//! ## Identity
//!
//! Equality is identity: two handles are equal only if they refer to the same
//! cell. Stores use this for compare-and-swap style primitives such as
//! `remove_value` and `replace_value`, so a race with a concurrent replacement
//! can never match a different computation holding an equal value.
//!
//! ## Example Usage
//!
//! ```
//! use loadkit::pending::Pending;
//!
//! let pending: Pending<u32> = Pending::new();
//! assert!(!pending.is_done());
//!
//! let producer = pending.clone();
//! std::thread::spawn(move || {
//!     producer.complete(42);
//! });
//!
//! assert_eq!(pending.wait().unwrap(), 42);
//! assert!(!pending.complete(7));
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{CacheError, LoadResult};

struct Cell<V> {
    outcome: OnceLock<LoadResult<V>>,
    lock: Mutex<()>,
    ready: Condvar,
}

/// Handle to a computation that resolves exactly once to a value or an error.
pub struct Pending<V> {
    cell: Arc<Cell<V>>,
}

impl<V> Pending<V> {
    /// Creates an in-flight computation.
    pub fn new() -> Self {
        Self {
            cell: Arc::new(Cell {
                outcome: OnceLock::new(),
                lock: Mutex::new(()),
                ready: Condvar::new(),
            }),
        }
    }

    /// Creates a computation that already succeeded with `value`.
    pub fn completed(value: V) -> Self {
        let pending = Self::new();
        let _ = pending.cell.outcome.set(Ok(value));
        pending
    }

    /// Creates a computation that already failed with `err`.
    pub fn failed(err: CacheError) -> Self {
        let pending = Self::new();
        let _ = pending.cell.outcome.set(Err(err));
        pending
    }

    /// Resolves the computation with `value`.
    ///
    /// Returns `false` if the computation had already finished.
    pub fn complete(&self, value: V) -> bool {
        self.resolve(Ok(value))
    }

    /// Resolves the computation with a failure.
    ///
    /// Returns `false` if the computation had already finished.
    pub fn fail(&self, err: CacheError) -> bool {
        self.resolve(Err(err))
    }

    /// Cancels the computation; waiters observe [`CacheError::Cancelled`].
    pub fn cancel(&self) -> bool {
        self.resolve(Err(CacheError::Cancelled))
    }

    fn resolve(&self, outcome: LoadResult<V>) -> bool {
        if self.cell.outcome.set(outcome).is_err() {
            return false;
        }
        // Taking the lock orders the write before any waiter's re-check.
        let _guard = self.cell.lock.lock();
        self.cell.ready.notify_all();
        true
    }

    /// Returns `true` once the computation has finished, successfully or not.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.cell.outcome.get().is_some()
    }

    /// Returns `true` if the computation finished with a failure or was cancelled.
    #[inline]
    pub fn is_completed_exceptionally(&self) -> bool {
        matches!(self.cell.outcome.get(), Some(Err(_)))
    }

    /// Returns `true` if the computation was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.cell.outcome.get(), Some(Err(err)) if err.is_cancelled())
    }

    /// Returns `true` if both handles refer to the same computation.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    fn block_until_done(&self, deadline: Option<Instant>) -> bool {
        if self.is_done() {
            return true;
        }
        let mut guard = self.cell.lock.lock();
        while !self.is_done() {
            match deadline {
                Some(deadline) => {
                    if self.cell.ready.wait_until(&mut guard, deadline).timed_out() {
                        return self.is_done();
                    }
                },
                None => self.cell.ready.wait(&mut guard),
            }
        }
        true
    }
}

impl<V: Clone> Pending<V> {
    /// Returns the outcome if finished, without blocking.
    pub fn peek(&self) -> Option<LoadResult<V>> {
        self.cell.outcome.get().cloned()
    }

    /// Blocks until the computation finishes and returns its outcome.
    pub fn wait(&self) -> LoadResult<V> {
        self.block_until_done(None);
        match self.cell.outcome.get() {
            Some(outcome) => outcome.clone(),
            None => unreachable!("pending computation woke up without an outcome"),
        }
    }

    /// Blocks for at most `timeout`; returns `None` if still in flight.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<LoadResult<V>> {
        let deadline = Instant::now() + timeout;
        if self.block_until_done(Some(deadline)) {
            self.peek()
        } else {
            None
        }
    }
}

impl<V> Clone for Pending<V> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<V> Default for Pending<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PartialEq for Pending<V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<V> Eq for Pending<V> {}

impl<V: fmt::Debug> fmt::Debug for Pending<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.outcome.get() {
            None => f.write_str("Pending(<in flight>)"),
            Some(Ok(value)) => f.debug_tuple("Pending").field(value).finish(),
            Some(Err(err)) => write!(f, "Pending(<failed: {err}>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn completed_is_done_and_peekable() {
        let pending = Pending::completed("a");
        assert!(pending.is_done());
        assert!(!pending.is_completed_exceptionally());
        assert_eq!(pending.peek().unwrap().unwrap(), "a");
    }

    #[test]
    fn first_resolution_wins() {
        let pending = Pending::new();
        assert!(pending.complete(1));
        assert!(!pending.complete(2));
        assert!(!pending.fail(CacheError::msg("late")));
        assert!(!pending.cancel());
        assert_eq!(pending.wait().unwrap(), 1);
    }

    #[test]
    fn cancel_reports_cancelled() {
        let pending: Pending<u8> = Pending::new();
        assert!(pending.cancel());
        assert!(pending.is_cancelled());
        assert!(pending.is_completed_exceptionally());
        assert!(pending.wait().unwrap_err().is_cancelled());
    }

    #[test]
    fn wait_blocks_until_completed_by_other_thread() {
        let pending: Pending<u64> = Pending::new();
        let producer = pending.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.complete(99);
        });
        assert_eq!(pending.wait().unwrap(), 99);
        handle.join().unwrap();
    }

    #[test]
    fn wait_timeout_expires_while_in_flight() {
        let pending: Pending<u64> = Pending::new();
        assert!(pending.wait_timeout(Duration::from_millis(10)).is_none());
        pending.complete(5);
        assert_eq!(pending.wait_timeout(Duration::from_millis(10)).unwrap().unwrap(), 5);
    }

    #[test]
    fn equality_is_identity() {
        let a = Pending::completed(1);
        let b = Pending::completed(1);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn debug_shows_state() {
        let pending: Pending<u8> = Pending::new();
        assert_eq!(format!("{:?}", pending), "Pending(<in flight>)");
        pending.complete(3);
        assert_eq!(format!("{:?}", pending), "Pending(3)");
    }
}
