/// Immutable snapshot of a cache's statistics.
///
/// Rates are defined as `1.0`/`0.0` when there were no requests, so an unused
/// cache reports a perfect hit rate rather than `NaN`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheStats {
    pub hit_count: u64,
    pub miss_count: u64,
    pub load_success_count: u64,
    pub load_failure_count: u64,
    /// Total nanoseconds spent loading, successful or not.
    pub total_load_time: u64,
}

impl CacheStats {
    /// Hits plus misses.
    pub fn request_count(&self) -> u64 {
        self.hit_count.saturating_add(self.miss_count)
    }

    pub fn hit_rate(&self) -> f64 {
        match self.request_count() {
            0 => 1.0,
            requests => self.hit_count as f64 / requests as f64,
        }
    }

    pub fn miss_rate(&self) -> f64 {
        match self.request_count() {
            0 => 0.0,
            requests => self.miss_count as f64 / requests as f64,
        }
    }

    /// Successful plus failed loads.
    pub fn load_count(&self) -> u64 {
        self.load_success_count
            .saturating_add(self.load_failure_count)
    }

    pub fn load_failure_rate(&self) -> f64 {
        match self.load_count() {
            0 => 0.0,
            loads => self.load_failure_count as f64 / loads as f64,
        }
    }

    /// Average nanoseconds spent per load.
    pub fn average_load_penalty(&self) -> f64 {
        match self.load_count() {
            0 => 0.0,
            loads => self.total_load_time as f64 / loads as f64,
        }
    }

    /// Difference `self - other`, floored at zero per counter.
    pub fn minus(&self, other: &CacheStats) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.saturating_sub(other.hit_count),
            miss_count: self.miss_count.saturating_sub(other.miss_count),
            load_success_count: self
                .load_success_count
                .saturating_sub(other.load_success_count),
            load_failure_count: self
                .load_failure_count
                .saturating_sub(other.load_failure_count),
            total_load_time: self.total_load_time.saturating_sub(other.total_load_time),
        }
    }

    /// Sum `self + other`, saturating per counter.
    pub fn plus(&self, other: &CacheStats) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.saturating_add(other.hit_count),
            miss_count: self.miss_count.saturating_add(other.miss_count),
            load_success_count: self
                .load_success_count
                .saturating_add(other.load_success_count),
            load_failure_count: self
                .load_failure_count
                .saturating_add(other.load_failure_count),
            total_load_time: self.total_load_time.saturating_add(other.total_load_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats_rates() {
        let stats = CacheStats::default();
        assert_eq!(stats.request_count(), 0);
        assert_eq!(stats.hit_rate(), 1.0);
        assert_eq!(stats.miss_rate(), 0.0);
        assert_eq!(stats.average_load_penalty(), 0.0);
    }

    #[test]
    fn derived_rates() {
        let stats = CacheStats {
            hit_count: 3,
            miss_count: 1,
            load_success_count: 1,
            load_failure_count: 1,
            total_load_time: 40,
        };
        assert_eq!(stats.request_count(), 4);
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(stats.miss_rate(), 0.25);
        assert_eq!(stats.load_count(), 2);
        assert_eq!(stats.load_failure_rate(), 0.5);
        assert_eq!(stats.average_load_penalty(), 20.0);
    }

    #[test]
    fn minus_floors_at_zero() {
        let a = CacheStats {
            hit_count: 1,
            ..CacheStats::default()
        };
        let b = CacheStats {
            hit_count: 5,
            miss_count: 2,
            ..CacheStats::default()
        };
        assert_eq!(b.minus(&a).hit_count, 4);
        assert_eq!(a.minus(&b), CacheStats::default());
        assert_eq!(a.plus(&b).hit_count, 6);
    }
}
