//! Test lifecycle: setup, staged load, threshold evaluation
//!
//! ```text
//! provision ──► SetupContext (frozen) ──► Ramp (N virtual users) ──► snapshot ──► thresholds
//! ```
//!
//! A setup failure ends the run before any virtual user starts.

mod ramp;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::client::ApiClient;
use crate::config::Config;
use crate::draws::RngDraws;
use crate::metrics::{Metrics, ThresholdReport};
use crate::setup::{self, SetupError};
use crate::summary::Summary;

pub use ramp::{Ramp, RampStats, Stage, target_at};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Setup failed: {0}")]
    Setup(#[from] SetupError),
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: Summary,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.summary.passed()
    }

    pub fn thresholds(&self) -> &ThresholdReport {
        &self.summary.thresholds
    }
}

/// Run the whole load test described by `config`
pub async fn run(config: &Config) -> Result<RunOutcome, RunError> {
    let metrics = Arc::new(Metrics::new());
    let client = ApiClient::new(&config.base_url, config.request_timeout, metrics.clone())?;

    info!("Provisioning test data against {}", client.base_url());
    let ctx = Arc::new(setup::provision(&client, &mut RngDraws::new()).await?);

    info!(
        "Starting ramp: {} stages over {:?}",
        config.stages.len(),
        config.total_duration()
    );
    let ramp = Ramp::new(config.stages.clone(), config.graceful_ramp_down);
    let stats = ramp.run(ctx, client).await;

    let snapshot = metrics.snapshot();
    let thresholds = ThresholdReport::evaluate(&config.thresholds, &snapshot);
    for failure in thresholds.failures() {
        info!(
            "Threshold crossed: {} {} (observed {:?})",
            failure.metric, failure.condition, failure.observed
        );
    }

    Ok(RunOutcome {
        summary: Summary::new(&snapshot, &stats, thresholds),
    })
}
