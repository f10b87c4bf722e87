//! Metric categories, accumulators and threshold evaluation
//!
//! This module provides:
//! - `Category` for the five endpoint groups the load test reports on
//! - `Metrics`, the concurrent registry every virtual user writes into
//! - `LatencyStats` / `RateStats` accumulators
//! - `Threshold` declarations evaluated after the run

mod registry;
mod stats;
pub mod thresholds;

use serde::Serialize;

pub use registry::{Metrics, MetricsSnapshot};
pub use stats::{LatencyStats, RateStats};
pub use thresholds::{Threshold, ThresholdOutcome, ThresholdReport};

/// Endpoint group a request or metric sample belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Public,
    Auth,
    Vehicle,
    Session,
    Payment,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Public,
        Category::Auth,
        Category::Vehicle,
        Category::Session,
        Category::Payment,
    ];

    /// Value of the `category` request tag
    pub fn tag(&self) -> &'static str {
        match self {
            Category::Public => "public",
            Category::Auth => "auth",
            Category::Vehicle => "vehicle",
            Category::Session => "session",
            Category::Payment => "payment",
        }
    }

    /// Name of the duration trend metric
    pub fn trend_name(&self) -> &'static str {
        match self {
            Category::Public => "public_stations_response_time",
            Category::Auth => "auth_response_time",
            Category::Vehicle => "vehicle_response_time",
            Category::Session => "session_response_time",
            Category::Payment => "payment_response_time",
        }
    }

    /// Name of the error rate metric
    pub fn rate_name(&self) -> &'static str {
        match self {
            Category::Public => "public_stations_error_rate",
            Category::Auth => "auth_error_rate",
            Category::Vehicle => "vehicle_error_rate",
            Category::Session => "session_error_rate",
            Category::Payment => "payment_error_rate",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.tag().eq_ignore_ascii_case(tag))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
