//! Weighted scenario selection and the per-iteration entry point
//!
//! Each iteration draws one value in `[0, 1)` and runs the first scenario
//! whose cumulative bound is above it:
//!
//! | Draw        | Scenario           | Weight |
//! |-------------|--------------------|--------|
//! | [0.0, 0.4)  | Public endpoints   | 40%    |
//! | [0.4, 0.7)  | Vehicle management | 30%    |
//! | [0.7, 0.9)  | Session management | 20%    |
//! | [0.9, 1.0)  | Payment (disabled) | 10%    |

pub mod payment;
pub mod public;
pub mod session;
pub mod vehicle;

use serde::Serialize;

use crate::client::ApiClient;
use crate::draws::Draws;
use crate::setup::SetupContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    PublicEndpoints,
    VehicleManagement,
    SessionManagement,
    Payment,
}

/// Cumulative upper bounds (exclusive) paired with the scenario they select
pub const DISPATCH_TABLE: [(f64, Scenario); 4] = [
    (0.4, Scenario::PublicEndpoints),
    (0.7, Scenario::VehicleManagement),
    (0.9, Scenario::SessionManagement),
    (1.0, Scenario::Payment),
];

impl Scenario {
    /// Pick the scenario for a draw in `[0, 1)`
    pub fn select(draw: f64) -> Scenario {
        DISPATCH_TABLE
            .iter()
            .find(|(bound, _)| draw < *bound)
            .map(|(_, scenario)| *scenario)
            .unwrap_or(Scenario::Payment)
    }

    /// Probability of being selected
    pub fn weight(&self) -> f64 {
        let mut lower = 0.0;
        for (bound, scenario) in DISPATCH_TABLE {
            if scenario == *self {
                return bound - lower;
            }
            lower = bound;
        }
        0.0
    }
}

/// Run one virtual-user iteration and report which scenario it picked
pub async fn iteration<D: Draws>(
    ctx: &SetupContext,
    client: &ApiClient,
    draws: &mut D,
) -> Scenario {
    let scenario = Scenario::select(draws.unit());
    match scenario {
        Scenario::PublicEndpoints => public::run(client, draws).await,
        Scenario::VehicleManagement => vehicle::run(ctx, client, draws).await,
        Scenario::SessionManagement => session::run(ctx, client, draws).await,
        // disabled until the backend payment flow is ready, see payment::run
        Scenario::Payment => {}
    }
    scenario
}
