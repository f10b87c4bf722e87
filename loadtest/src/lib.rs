//! Spike load test for the EV charging backend
//!
//! A one-time setup provisions a test user, discovers charging stations and
//! creates a vehicle. Virtual users then repeatedly run one of four weighted
//! scenarios against the backend while their latency and error rates are
//! recorded per endpoint category and checked against thresholds.

pub mod client;
pub mod config;
pub mod draws;
pub mod metrics;
pub mod runner;
pub mod scenario;
pub mod setup;
pub mod summary;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::Config;
pub use draws::{Draws, RngDraws, ScriptedDraws};
pub use metrics::{Category, Metrics};
pub use runner::{RunOutcome, run};
pub use scenario::Scenario;
pub use setup::{SetupContext, SetupError};
