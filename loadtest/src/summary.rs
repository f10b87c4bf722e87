//! End-of-run summary: text report for the console and JSON for export

use std::time::Duration;

use serde::Serialize;

use crate::metrics::{Category, LatencyStats, MetricsSnapshot, ThresholdReport};
use crate::runner::RampStats;

fn ms(d: Duration) -> f64 {
    d.as_micros() as f64 / 1000.0
}

/// Percentile summary of one trend
#[derive(Debug, Clone, Serialize)]
pub struct TrendSummary {
    pub count: usize,
    pub mean_ms: Option<f64>,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub max_ms: Option<f64>,
}

impl TrendSummary {
    pub fn from_stats(stats: Option<&LatencyStats>) -> Self {
        let empty = LatencyStats::new();
        let stats = stats.unwrap_or(&empty);
        Self {
            count: stats.len(),
            mean_ms: stats.mean().map(ms),
            p50_ms: stats.p50().map(ms),
            p95_ms: stats.p95().map(ms),
            p99_ms: stats.p99().map(ms),
            max_ms: stats.max().map(ms),
        }
    }

    fn line(&self) -> String {
        let fmt = |v: Option<f64>| {
            v.map(|v| format!("{:.1}ms", v))
                .unwrap_or_else(|| "-".to_string())
        };
        format!(
            "n={} avg={} p50={} p95={} p99={} max={}",
            self.count,
            fmt(self.mean_ms),
            fmt(self.p50_ms),
            fmt(self.p95_ms),
            fmt(self.p99_ms),
            fmt(self.max_ms)
        )
    }
}

/// Custom and request-level metrics of one category
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub response_time: TrendSummary,
    pub error_rate: Option<f64>,
    pub error_samples: u64,
    pub requests: TrendSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
    pub total: u64,
    pub failed: u64,
    pub failed_rate: Option<f64>,
    pub duration: TrendSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub duration_secs: f64,
    pub iterations: u64,
    pub peak_vus: usize,
    pub interrupted_iterations: usize,
    pub requests: RequestSummary,
    pub categories: Vec<CategorySummary>,
    pub thresholds: ThresholdReport,
}

impl Summary {
    pub fn new(snapshot: &MetricsSnapshot, ramp: &RampStats, thresholds: ThresholdReport) -> Self {
        let failed = snapshot.requests_failed();
        let all = snapshot.all_request_durations();

        let categories = Category::ALL
            .into_iter()
            .map(|category| {
                let errors = snapshot.error_rate(category);
                CategorySummary {
                    category,
                    response_time: TrendSummary::from_stats(snapshot.trend(category)),
                    error_rate: errors.rate(),
                    error_samples: errors.total,
                    requests: TrendSummary::from_stats(snapshot.request_durations(Some(category))),
                }
            })
            .collect();

        Self {
            duration_secs: ramp.duration.as_secs_f64(),
            iterations: ramp.iterations,
            peak_vus: ramp.peak_vus,
            interrupted_iterations: ramp.interrupted,
            requests: RequestSummary {
                total: failed.total,
                failed: failed.hits,
                failed_rate: failed.rate(),
                duration: TrendSummary::from_stats(Some(&all)),
            },
            categories,
            thresholds,
        }
    }

    pub fn passed(&self) -> bool {
        self.thresholds.passed()
    }

    /// Generate a summary report
    pub fn report(&self) -> String {
        let mut report = String::new();
        report.push_str("=== Charging Backend Spike Test ===\n\n");

        report.push_str(&format!("Duration: {:.2}s\n", self.duration_secs));
        report.push_str(&format!("Iterations: {}\n", self.iterations));
        report.push_str(&format!("Peak virtual users: {}\n", self.peak_vus));
        if self.interrupted_iterations > 0 {
            report.push_str(&format!(
                "Interrupted iterations: {}\n",
                self.interrupted_iterations
            ));
        }

        report.push_str(&format!(
            "\nHTTP requests: {} ({} failed",
            self.requests.total, self.requests.failed
        ));
        if let Some(rate) = self.requests.failed_rate {
            report.push_str(&format!(", {:.2}%", rate * 100.0));
        }
        report.push_str(")\n");
        report.push_str(&format!("  http_req_duration: {}\n", self.requests.duration.line()));

        for c in &self.categories {
            if c.response_time.count == 0 && c.requests.count == 0 && c.error_samples == 0 {
                continue;
            }
            report.push_str(&format!("\n[{}]\n", c.category));
            report.push_str(&format!(
                "  {}: {}\n",
                c.category.trend_name(),
                c.response_time.line()
            ));
            match c.error_rate {
                Some(rate) => report.push_str(&format!(
                    "  {}: {:.2}% of {}\n",
                    c.category.rate_name(),
                    rate * 100.0,
                    c.error_samples
                )),
                None => report.push_str(&format!("  {}: -\n", c.category.rate_name())),
            }
            report.push_str(&format!(
                "  http_req_duration{{category:{}}}: {}\n",
                c.category.tag(),
                c.requests.line()
            ));
        }

        report.push_str("\nThresholds:\n");
        for outcome in &self.thresholds.outcomes {
            let observed = outcome
                .observed
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "no data".to_string());
            report.push_str(&format!(
                "  [{}] {} {} (observed: {})\n",
                if outcome.passed { "PASS" } else { "FAIL" },
                outcome.metric,
                outcome.condition,
                observed
            ));
        }

        report.push_str(&format!(
            "\nOVERALL: {}\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));
        report
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
