//! Vehicle listing and registration for the test user

use reqwest::StatusCode;

use crate::client::{ApiClient, ConnectorType, VehiclePayload, paths};
use crate::draws::Draws;
use crate::metrics::Category;
use crate::setup::SetupContext;

/// Share of vehicle iterations that list vehicles, when any are known
pub const LIST_SHARE: f64 = 0.8;

/// Vehicle with a three-segment random plate, e.g. `4821_7_93`
pub fn random_vehicle<D: Draws>(draws: &mut D) -> VehiclePayload {
    let plate = format!(
        "{}_{}_{}",
        draws.below(10_000),
        draws.below(100),
        draws.below(100)
    );
    VehiclePayload {
        brand: "TEST".to_string(),
        model: "MUSK".to_string(),
        license_plate: plate,
        connector_type: draws
            .pick(&ConnectorType::VEHICLE)
            .copied()
            .unwrap_or(ConnectorType::Ccs),
    }
}

pub async fn run<D: Draws>(ctx: &SetupContext, client: &ApiClient, draws: &mut D) {
    let token = Some(ctx.auth_token.as_str());

    if !ctx.vehicle_ids.is_empty() && draws.unit() < LIST_SHARE {
        let resp = client
            .get(paths::VEHICLES, token, Some(Category::Vehicle))
            .await;
        let success = resp.is_status(StatusCode::OK);
        client
            .metrics()
            .record(Category::Vehicle, resp.elapsed, success);
    } else {
        let payload = random_vehicle(draws);
        let resp = client
            .post(paths::VEHICLES, Some(&payload), token, Some(Category::Vehicle))
            .await;
        let success = resp.is_status(StatusCode::OK) && resp.has_field("id");
        client
            .metrics()
            .record(Category::Vehicle, resp.elapsed, success);
    }
}
