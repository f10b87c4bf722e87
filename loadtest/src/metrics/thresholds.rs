//! Pass/fail conditions over aggregated metrics

use std::time::Duration;

use serde::Serialize;

use super::{Category, MetricsSnapshot};

/// A declared pass/fail condition evaluated after the run
#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    /// p95 of `http_req_duration{category:<tag>}` must stay under `max`
    RequestDurationP95 { category: Category, max: Duration },
    /// Fraction of failed requests (any tag) must stay under `max`
    RequestFailureRate { max: f64 },
    /// Scenario error rate of a category must stay under `max`
    ErrorRate { category: Category, max: f64 },
}

impl Threshold {
    /// Thresholds declared by the spike test
    pub fn defaults() -> Vec<Threshold> {
        vec![
            Threshold::RequestDurationP95 {
                category: Category::Public,
                max: Duration::from_millis(800),
            },
            Threshold::RequestDurationP95 {
                category: Category::Auth,
                max: Duration::from_millis(1200),
            },
            Threshold::RequestDurationP95 {
                category: Category::Vehicle,
                max: Duration::from_millis(1000),
            },
            Threshold::RequestDurationP95 {
                category: Category::Session,
                max: Duration::from_millis(1500),
            },
            Threshold::RequestFailureRate { max: 0.05 },
            Threshold::ErrorRate {
                category: Category::Public,
                max: 0.03,
            },
            Threshold::ErrorRate {
                category: Category::Auth,
                max: 0.02,
            },
            Threshold::ErrorRate {
                category: Category::Vehicle,
                max: 0.04,
            },
            Threshold::ErrorRate {
                category: Category::Session,
                max: 0.06,
            },
        ]
    }

    /// Metric the threshold applies to, e.g. `http_req_duration{category:public}`
    pub fn metric(&self) -> String {
        match self {
            Threshold::RequestDurationP95 { category, .. } => {
                format!("http_req_duration{{category:{}}}", category.tag())
            }
            Threshold::RequestFailureRate { .. } => "http_req_failed".to_string(),
            Threshold::ErrorRate { category, .. } => category.rate_name().to_string(),
        }
    }

    /// Condition in k6 notation, e.g. `p(95)<800`
    pub fn condition(&self) -> String {
        match self {
            Threshold::RequestDurationP95 { max, .. } => format!("p(95)<{}", max.as_millis()),
            Threshold::RequestFailureRate { max } | Threshold::ErrorRate { max, .. } => {
                format!("rate<{}", max)
            }
        }
    }

    /// Evaluate against a snapshot. A metric without samples passes.
    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> ThresholdOutcome {
        let (observed, passed) = match self {
            Threshold::RequestDurationP95 { category, max } => {
                let p95 = snapshot
                    .request_durations(Some(*category))
                    .and_then(|stats| stats.p95());
                (
                    p95.map(|d| d.as_micros() as f64 / 1000.0),
                    p95.map(|d| d < *max).unwrap_or(true),
                )
            }
            Threshold::RequestFailureRate { max } => {
                let rate = snapshot.requests_failed().rate();
                (rate, rate.map(|r| r < *max).unwrap_or(true))
            }
            Threshold::ErrorRate { category, max } => {
                let rate = snapshot.error_rate(*category).rate();
                (rate, rate.map(|r| r < *max).unwrap_or(true))
            }
        };

        ThresholdOutcome {
            metric: self.metric(),
            condition: self.condition(),
            observed,
            passed,
        }
    }
}

/// Result of one threshold
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdOutcome {
    pub metric: String,
    pub condition: String,
    /// Observed value (milliseconds for latency, fraction for rates)
    pub observed: Option<f64>,
    pub passed: bool,
}

/// Results of every declared threshold
#[derive(Debug, Clone, Default, Serialize)]
pub struct ThresholdReport {
    pub outcomes: Vec<ThresholdOutcome>,
}

impl ThresholdReport {
    pub fn evaluate(thresholds: &[Threshold], snapshot: &MetricsSnapshot) -> Self {
        Self {
            outcomes: thresholds.iter().map(|t| t.evaluate(snapshot)).collect(),
        }
    }

    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ThresholdOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}
