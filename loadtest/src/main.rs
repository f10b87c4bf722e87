use std::process::ExitCode;

use charging_loadtest::config::Config;
use charging_loadtest::runner::{self, RunError};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status when any threshold is crossed
const EXIT_THRESHOLDS_FAILED: u8 = 99;
/// Exit status when setup aborts the run
const EXIT_SETUP_FAILED: u8 = 107;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "charging_loadtest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: base_url={}, stages={}, thresholds={}",
        config.base_url,
        config.stages.len(),
        config.thresholds.len()
    );

    if let Some(addr) = config.prometheus_listen {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!("Prometheus metrics available on http://{}/metrics", addr);
    }

    let outcome = match runner::run(&config).await {
        Ok(outcome) => outcome,
        Err(RunError::Setup(e)) => {
            error!("Aborting run, no load generated: {}", e);
            return Ok(ExitCode::from(EXIT_SETUP_FAILED));
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", outcome.summary.report());

    if let Some(ref path) = config.summary_export {
        match outcome.summary.to_json() {
            Ok(json) => match std::fs::write(path, json) {
                Ok(()) => info!("Summary written to {:?}", path),
                Err(e) => warn!("Failed to write summary to {:?}: {}", path, e),
            },
            Err(e) => warn!("Failed to serialize summary: {}", e),
        }
    }

    if outcome.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_THRESHOLDS_FAILED))
    }
}
