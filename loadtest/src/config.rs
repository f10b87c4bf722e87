//! Load test configuration
//!
//! Configuration is loaded from environment variables. Every field has a
//! default matching the spike test profile; a variable that is set but cannot
//! be parsed is an error.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::metrics::{Category, Threshold};
use crate::runner::Stage;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },

    #[error("Invalid stage {0:?}, expected <duration>:<target> such as 20s:25")]
    InvalidStage(String),

    #[error("At least one stage is required")]
    NoStages,
}

/// Main load test configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL
    pub base_url: String,
    /// Virtual-user ramp
    pub stages: Vec<Stage>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Time stopped virtual users get to finish their iteration
    pub graceful_ramp_down: Duration,
    /// Pass/fail conditions evaluated after the run
    pub thresholds: Vec<Threshold>,
    /// Address for the Prometheus scrape endpoint (optional)
    pub prometheus_listen: Option<SocketAddr>,
    /// Where to write the JSON summary (optional)
    pub summary_export: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://backend:8001".to_string(),
            stages: vec![
                Stage::new(Duration::from_secs(20), 25),
                Stage::new(Duration::from_secs(40), 35),
                Stage::new(Duration::from_secs(20), 50),
                Stage::new(Duration::from_secs(20), 0),
            ],
            request_timeout: Duration::from_secs(60),
            graceful_ramp_down: Duration::from_secs(30),
            thresholds: Threshold::defaults(),
            prometheus_listen: None,
            summary_export: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("BASE_URL")
            && !url.is_empty()
        {
            config.base_url = url;
        }
        if let Some(val) = lookup("STAGES") {
            config.stages = parse_stages(&val)?;
        }
        if let Some(val) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", &val)?);
        }
        if let Some(val) = lookup("GRACEFUL_RAMP_DOWN_SECS") {
            config.graceful_ramp_down =
                Duration::from_secs(parse_var("GRACEFUL_RAMP_DOWN_SECS", &val)?);
        }
        if let Some(val) = lookup("PROMETHEUS_LISTEN")
            && !val.is_empty()
        {
            config.prometheus_listen = Some(parse_var("PROMETHEUS_LISTEN", &val)?);
        }
        if let Some(path) = lookup("SUMMARY_EXPORT")
            && !path.is_empty()
        {
            config.summary_export = Some(PathBuf::from(path));
        }

        // Threshold overrides
        for category in Category::ALL {
            let upper = category.tag().to_uppercase();

            let var = format!("THRESHOLD_P95_{}_MS", upper);
            if let Some(val) = lookup(&var) {
                let max = Duration::from_millis(parse_var(&var, &val)?);
                config.set_threshold(Threshold::RequestDurationP95 { category, max });
            }

            let var = format!("THRESHOLD_ERROR_RATE_{}", upper);
            if let Some(val) = lookup(&var) {
                let max = parse_rate(&var, &val)?;
                config.set_threshold(Threshold::ErrorRate { category, max });
            }
        }
        if let Some(val) = lookup("THRESHOLD_HTTP_REQ_FAILED") {
            let max = parse_rate("THRESHOLD_HTTP_REQ_FAILED", &val)?;
            config.set_threshold(Threshold::RequestFailureRate { max });
        }

        Ok(config)
    }

    /// Replace the threshold on the same metric, or add it
    fn set_threshold(&mut self, threshold: Threshold) {
        let metric = threshold.metric();
        match self.thresholds.iter_mut().find(|t| t.metric() == metric) {
            Some(existing) => *existing = threshold,
            None => self.thresholds.push(threshold),
        }
    }

    /// Total length of the ramp
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            var: var.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_rate(var: &str, value: &str) -> Result<f64, ConfigError> {
    let rate: f64 = parse_var(var, value)?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            value: value.to_string(),
            reason: "rate must be between 0 and 1".to_string(),
        });
    }
    Ok(rate)
}

/// Parse `20s:25,1m30s:35` into stages
///
/// Durations use humantime syntax, so compound values like `1m30s` work.
pub fn parse_stages(s: &str) -> Result<Vec<Stage>, ConfigError> {
    let stages = s
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (duration, target) = part
                .split_once(':')
                .ok_or_else(|| ConfigError::InvalidStage(part.to_string()))?;
            let duration = humantime::parse_duration(duration.trim())
                .map_err(|_| ConfigError::InvalidStage(part.to_string()))?;
            let target = target
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidStage(part.to_string()))?;
            Ok(Stage::new(duration, target))
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    if stages.is_empty() {
        return Err(ConfigError::NoStages);
    }
    Ok(stages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://backend:8001");
        assert_eq!(config.stages.len(), 4);
        assert_eq!(config.stages[2], Stage::new(Duration::from_secs(20), 50));
        assert_eq!(config.total_duration(), Duration::from_secs(100));
        assert_eq!(config.thresholds.len(), 9);
        assert!(config.prometheus_listen.is_none());
    }

    #[test]
    fn test_config_from_empty_lookup() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.base_url, "http://backend:8001");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("BASE_URL", "http://localhost:9000"),
            ("STAGES", "5s:2, 500ms:0"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("PROMETHEUS_LISTEN", "127.0.0.1:9100"),
            ("THRESHOLD_P95_PUBLIC_MS", "300"),
            ("THRESHOLD_ERROR_RATE_PAYMENT", "0.1"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(
            config.stages,
            vec![
                Stage::new(Duration::from_secs(5), 2),
                Stage::new(Duration::from_millis(500), 0)
            ]
        );
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.prometheus_listen.is_some());
        assert!(config.thresholds.contains(&Threshold::RequestDurationP95 {
            category: Category::Public,
            max: Duration::from_millis(300),
        }));
        // replaced, not duplicated
        assert_eq!(config.thresholds.len(), 10);
        assert!(config.thresholds.contains(&Threshold::ErrorRate {
            category: Category::Payment,
            max: 0.1,
        }));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("REQUEST_TIMEOUT_SECS", "soon")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("THRESHOLD_HTTP_REQ_FAILED", "5")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("STAGES", "20s")])),
            Err(ConfigError::InvalidStage(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("STAGES", " , ")])),
            Err(ConfigError::NoStages)
        ));
    }

    #[test]
    fn test_stage_duration_units() {
        let stages = parse_stages("250ms:1, 20s:2, 2m:3, 1h:4, 1m30s:5").unwrap();
        let durations: Vec<_> = stages.iter().map(|s| s.duration).collect();
        assert_eq!(
            durations,
            vec![
                Duration::from_millis(250),
                Duration::from_secs(20),
                Duration::from_secs(120),
                Duration::from_secs(3600),
                Duration::from_secs(90),
            ]
        );
        assert_eq!(stages[4].target, 5);
    }

    #[test]
    fn test_stage_duration_requires_unit() {
        assert!(matches!(parse_stages("20:5"), Err(ConfigError::InvalidStage(_))));
        assert!(matches!(parse_stages("s:5"), Err(ConfigError::InvalidStage(_))));
        assert!(matches!(parse_stages("10q:5"), Err(ConfigError::InvalidStage(_))));
    }
}
