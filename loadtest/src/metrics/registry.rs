//! Concurrent metric registry shared by all virtual users

use std::collections::BTreeMap;
use std::time::Duration;

use dashmap::DashMap;
use ::metrics::{counter, histogram};

use super::Category;
use super::stats::{LatencyStats, RateStats};

/// Write-only sink during the run, read once at the end via [`Metrics::snapshot`]
///
/// Custom metrics (one trend + one error rate per category) are written by the
/// scenario handlers. Request metrics are written by the HTTP client for every
/// call, keyed by the request's category tag.
#[derive(Debug, Default)]
pub struct Metrics {
    trends: DashMap<Category, LatencyStats>,
    error_rates: DashMap<Category, RateStats>,
    request_durations: DashMap<Option<Category>, LatencyStats>,
    requests_failed: DashMap<Option<Category>, RateStats>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one scenario outcome: duration into the trend, `!success` into the error rate
    pub fn record(&self, category: Category, elapsed: Duration, success: bool) {
        self.add_duration(category, elapsed);
        self.add_error(category, !success);
    }

    /// Append a sample to the category's duration trend
    pub fn add_duration(&self, category: Category, elapsed: Duration) {
        self.trends.entry(category).or_default().record(elapsed);
        histogram!(category.trend_name()).record(elapsed.as_secs_f64() * 1000.0);
    }

    /// Append a sample to the category's error rate
    pub fn add_error(&self, category: Category, failed: bool) {
        self.error_rates.entry(category).or_default().add(failed);
        counter!(category.rate_name(), "failed" => failed.to_string()).increment(1);
    }

    /// Record a completed HTTP request
    pub fn record_request(&self, tag: Option<Category>, elapsed: Duration, failed: bool) {
        self.request_durations
            .entry(tag)
            .or_default()
            .record(elapsed);
        self.requests_failed.entry(tag).or_default().add(failed);

        let label = tag.map(|c| c.tag()).unwrap_or("");
        histogram!("http_req_duration", "category" => label)
            .record(elapsed.as_secs_f64() * 1000.0);
        counter!("http_reqs", "category" => label).increment(1);
        if failed {
            counter!("http_req_failed", "category" => label).increment(1);
        }
    }

    /// Copy of everything recorded so far
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            trends: self
                .trends
                .iter()
                .map(|e| (*e.key(), e.value().clone()))
                .collect(),
            error_rates: self
                .error_rates
                .iter()
                .map(|e| (*e.key(), *e.value()))
                .collect(),
            request_durations: self
                .request_durations
                .iter()
                .map(|e| (*e.key(), e.value().clone()))
                .collect(),
            requests_failed: self
                .requests_failed
                .iter()
                .map(|e| (*e.key(), *e.value()))
                .collect(),
        }
    }
}

/// Immutable view of the registry
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    trends: BTreeMap<Category, LatencyStats>,
    error_rates: BTreeMap<Category, RateStats>,
    request_durations: BTreeMap<Option<Category>, LatencyStats>,
    requests_failed: BTreeMap<Option<Category>, RateStats>,
}

impl MetricsSnapshot {
    /// Scenario-recorded durations for a category
    pub fn trend(&self, category: Category) -> Option<&LatencyStats> {
        self.trends.get(&category)
    }

    /// Scenario-recorded error rate for a category
    pub fn error_rate(&self, category: Category) -> RateStats {
        self.error_rates.get(&category).copied().unwrap_or_default()
    }

    /// Durations of every request carrying the given tag
    pub fn request_durations(&self, tag: Option<Category>) -> Option<&LatencyStats> {
        self.request_durations.get(&tag)
    }

    /// Failed-request rate across all requests, tagged or not
    pub fn requests_failed(&self) -> RateStats {
        self.requests_failed
            .values()
            .fold(RateStats::default(), |acc, r| RateStats {
                hits: acc.hits + r.hits,
                total: acc.total + r.total,
            })
    }

    /// Number of requests carrying the given tag
    pub fn requests_with_tag(&self, tag: Option<Category>) -> u64 {
        self.requests_failed
            .get(&tag)
            .map(|r| r.total)
            .unwrap_or(0)
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_failed().total
    }

    /// Total number of custom metric samples (trend + rate) across categories
    pub fn custom_samples(&self) -> usize {
        let trend: usize = self.trends.values().map(LatencyStats::len).sum();
        let rate: u64 = self.error_rates.values().map(|r| r.total).sum();
        trend + rate as usize
    }

    /// Durations of all requests regardless of tag
    pub fn all_request_durations(&self) -> LatencyStats {
        let mut all = LatencyStats::new();
        for stats in self.request_durations.values() {
            all.merge(stats);
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_pairs_trend_and_rate() {
        let metrics = Metrics::new();
        metrics.record(Category::Vehicle, Duration::from_millis(12), true);
        metrics.record(Category::Vehicle, Duration::from_millis(30), false);

        let snap = metrics.snapshot();
        assert_eq!(snap.trend(Category::Vehicle).map(|t| t.len()), Some(2));
        assert_eq!(snap.error_rate(Category::Vehicle).rate(), Some(0.5));
        assert!(snap.trend(Category::Public).is_none());
        assert_eq!(snap.custom_samples(), 4);
    }

    #[test]
    fn test_request_metrics_by_tag() {
        let metrics = Metrics::new();
        metrics.record_request(None, Duration::from_millis(5), false);
        metrics.record_request(Some(Category::Public), Duration::from_millis(7), true);
        metrics.record_request(Some(Category::Public), Duration::from_millis(9), false);

        let snap = metrics.snapshot();
        assert_eq!(snap.requests_total(), 3);
        assert_eq!(snap.requests_with_tag(Some(Category::Public)), 2);
        assert_eq!(snap.requests_with_tag(None), 1);
        assert_eq!(snap.requests_failed().hits, 1);
        assert_eq!(snap.all_request_durations().len(), 3);
        assert_eq!(snap.custom_samples(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let metrics = std::sync::Arc::new(Metrics::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let metrics = metrics.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    metrics.record(Category::Session, Duration::from_millis(1), true);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let snap = metrics.snapshot();
        assert_eq!(snap.error_rate(Category::Session).total, 800);
    }
}
