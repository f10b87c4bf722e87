//! Sample accumulators: latency trends and boolean rates

use std::time::Duration;

/// Latency samples for one trend metric
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    pub samples: Vec<Duration>,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    pub fn record(&mut self, latency: Duration) {
        self.samples.push(latency);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Calculate percentile (0-100)
    pub fn percentile(&self, p: f64) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }

        let mut sorted = self.samples.clone();
        sorted.sort();

        let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }

    pub fn p50(&self) -> Option<Duration> {
        self.percentile(50.0)
    }

    pub fn p95(&self) -> Option<Duration> {
        self.percentile(95.0)
    }

    pub fn p99(&self) -> Option<Duration> {
        self.percentile(99.0)
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let total: Duration = self.samples.iter().sum();
        Some(total / self.samples.len() as u32)
    }

    pub fn max(&self) -> Option<Duration> {
        self.samples.iter().max().copied()
    }

    pub fn merge(&mut self, other: &LatencyStats) {
        self.samples.extend_from_slice(&other.samples);
    }
}

/// Boolean samples summarized as the fraction of `true` values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateStats {
    pub hits: u64,
    pub total: u64,
}

impl RateStats {
    pub fn add(&mut self, value: bool) {
        self.total += 1;
        if value {
            self.hits += 1;
        }
    }

    /// Fraction of `true` samples, `None` when nothing was recorded
    pub fn rate(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.hits as f64 / self.total as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_percentiles_on_empty_stats() {
        let stats = LatencyStats::new();
        assert!(stats.p95().is_none());
        assert!(stats.mean().is_none());
    }

    #[test]
    fn test_percentiles_nearest_rank() {
        let mut stats = LatencyStats::new();
        for v in 1..=100 {
            stats.record(ms(v));
        }
        assert_eq!(stats.p50(), Some(ms(51)));
        assert_eq!(stats.p95(), Some(ms(95)));
        assert_eq!(stats.p99(), Some(ms(99)));
        assert_eq!(stats.max(), Some(ms(100)));
    }

    #[test]
    fn test_percentile_unsorted_input() {
        let mut stats = LatencyStats::new();
        for v in [30, 10, 20] {
            stats.record(ms(v));
        }
        assert_eq!(stats.p50(), Some(ms(20)));
        assert_eq!(stats.mean(), Some(ms(20)));
    }

    #[test]
    fn test_rate_stats() {
        let mut rate = RateStats::default();
        assert_eq!(rate.rate(), None);
        rate.add(true);
        rate.add(false);
        rate.add(false);
        rate.add(false);
        assert_eq!(rate.rate(), Some(0.25));
    }
}
