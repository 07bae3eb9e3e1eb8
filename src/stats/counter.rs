use std::sync::atomic::{AtomicU64, Ordering};

use crate::stats::{CacheStats, StatsCounter};

/// Thread-safe statistics counter backed by relaxed atomics.
///
/// Each counter is independent; a snapshot taken while other threads record
/// may mix values from slightly different instants.
#[derive(Debug, Default)]
pub struct ConcurrentStatsCounter {
    hits: AtomicU64,
    misses: AtomicU64,
    load_success: AtomicU64,
    load_failure: AtomicU64,
    total_load_time: AtomicU64,
}

impl ConcurrentStatsCounter {
    /// Creates a counter with every count at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsCounter for ConcurrentStatsCounter {
    fn record_hits(&self, count: u64) {
        self.hits.fetch_add(count, Ordering::Relaxed);
    }

    fn record_misses(&self, count: u64) {
        self.misses.fetch_add(count, Ordering::Relaxed);
    }

    fn record_load_success(&self, load_time: u64) {
        self.load_success.fetch_add(1, Ordering::Relaxed);
        self.total_load_time.fetch_add(load_time, Ordering::Relaxed);
    }

    fn record_load_failure(&self, load_time: u64) {
        self.load_failure.fetch_add(1, Ordering::Relaxed);
        self.total_load_time.fetch_add(load_time, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            load_success_count: self.load_success.load(Ordering::Relaxed),
            load_failure_count: self.load_failure.load(Ordering::Relaxed),
            total_load_time: self.total_load_time.load(Ordering::Relaxed),
        }
    }
}

/// Counter that discards everything; used when stats recording is off.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStatsCounter;

impl StatsCounter for DisabledStatsCounter {
    fn record_hits(&self, _count: u64) {}

    fn record_misses(&self, _count: u64) {}

    fn record_load_success(&self, _load_time: u64) {}

    fn record_load_failure(&self, _load_time: u64) {}

    fn snapshot(&self) -> CacheStats {
        CacheStats::default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn concurrent_counter_records() {
        let counter = ConcurrentStatsCounter::new();
        counter.record_hits(3);
        counter.record_misses(2);
        counter.record_load_success(100);
        counter.record_load_failure(50);

        let stats = counter.snapshot();
        assert_eq!(stats.hit_count, 3);
        assert_eq!(stats.miss_count, 2);
        assert_eq!(stats.load_success_count, 1);
        assert_eq!(stats.load_failure_count, 1);
        assert_eq!(stats.total_load_time, 150);
    }

    #[test]
    fn disabled_counter_stays_empty() {
        let counter = DisabledStatsCounter;
        counter.record_hits(10);
        counter.record_load_failure(10);
        assert_eq!(counter.snapshot(), CacheStats::default());
    }

    #[test]
    fn concurrent_hits_are_not_lost() {
        let counter = Arc::new(ConcurrentStatsCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        counter.record_hits(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.snapshot().hit_count, 8_000);
    }
}
