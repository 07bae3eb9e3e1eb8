//! Time sources used to measure load latency.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A source of monotonic nanoseconds.
pub trait Ticker: Send + Sync {
    /// Nanoseconds elapsed since an arbitrary, fixed origin.
    fn read(&self) -> u64;
}

/// Ticker backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemTicker {
    origin: Instant,
}

impl SystemTicker {
    /// Ticker whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker for SystemTicker {
    fn read(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Ticker that always reads zero. Used when statistics are not recorded.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledTicker;

impl Ticker for DisabledTicker {
    fn read(&self) -> u64 {
        0
    }
}

/// Manually advanced ticker for deterministic tests.
///
/// ```
/// use std::time::Duration;
/// use loadkit::time::{FakeTicker, Ticker};
///
/// let ticker = FakeTicker::new();
/// ticker.advance(Duration::from_millis(2));
/// assert_eq!(ticker.read(), 2_000_000);
/// ```
#[derive(Debug, Default)]
pub struct FakeTicker {
    nanos: AtomicU64,
    auto_increment: AtomicU64,
}

impl FakeTicker {
    /// Ticker reading zero until advanced.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Advances the clock by `step` after every read.
    pub fn set_auto_increment(&self, step: Duration) {
        let nanos = u64::try_from(step.as_nanos()).unwrap_or(u64::MAX);
        self.auto_increment.store(nanos, Ordering::SeqCst);
    }
}

impl Ticker for FakeTicker {
    fn read(&self) -> u64 {
        let step = self.auto_increment.load(Ordering::SeqCst);
        self.nanos.fetch_add(step, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_ticker_is_monotonic() {
        let ticker = SystemTicker::new();
        let a = ticker.read();
        let b = ticker.read();
        assert!(b >= a);
    }

    #[test]
    fn disabled_ticker_reads_zero() {
        assert_eq!(DisabledTicker.read(), 0);
    }

    #[test]
    fn fake_ticker_auto_increments() {
        let ticker = FakeTicker::new();
        ticker.set_auto_increment(Duration::from_nanos(5));
        assert_eq!(ticker.read(), 0);
        assert_eq!(ticker.read(), 5);
        ticker.advance(Duration::from_nanos(100));
        assert_eq!(ticker.read(), 110);
    }
}
