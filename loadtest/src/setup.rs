//! One-time provisioning that runs before any load is generated
//!
//! Registers and logs in a throwaway user, collects the known charging
//! stations and creates one vehicle. The resulting [`SetupContext`] is frozen
//! and shared read-only with every virtual user.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::client::{
    ApiClient, ConnectorType, Credentials, LoginResponse, NewUser, ResourceId, VehiclePayload,
    paths,
};
use crate::draws::Draws;

pub const TEST_PASSWORD: &str = "TestPassword123!";

/// Fatal provisioning failures; any of these aborts the run before load starts
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Failed to create test user: HTTP {0}")]
    UserCreation(u16),

    #[error("Failed to login: HTTP {0}")]
    Login(u16),

    #[error("Login response is malformed: {0}")]
    MalformedLogin(#[source] serde_json::Error),
}

/// The user the run acts as
#[derive(Debug, Clone)]
pub struct TestIdentity {
    pub name: String,
    pub email: String,
    pub password: String,
    pub token: String,
    pub user_id: Option<Value>,
}

/// Immutable snapshot handed to every iteration
#[derive(Debug, Clone)]
pub struct SetupContext {
    pub auth_token: String,
    pub station_ids: Vec<ResourceId>,
    /// One entry per vehicle the backend accepted; `None` when it returned no id
    pub vehicle_ids: Vec<Option<ResourceId>>,
    pub test_user_id: Option<Value>,
}

impl SetupContext {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            station_ids: Vec::new(),
            vehicle_ids: Vec::new(),
            test_user_id: None,
        }
    }
}

/// Registration body with a time-seeded unique name and email
pub fn test_user(timestamp_ms: i64) -> NewUser {
    NewUser {
        name: format!("LoadTestUser_{}", timestamp_ms),
        email: format!("loadtest_{}@example.com", timestamp_ms),
        password: TEST_PASSWORD.to_string(),
    }
}

/// Vehicle created during setup: fixed make, randomized plate
pub fn setup_vehicle<D: Draws>(draws: &mut D) -> VehiclePayload {
    VehiclePayload {
        brand: "Tesla".to_string(),
        model: "Model S".to_string(),
        license_plate: format!("TEST_{}", draws.below(100_000)),
        connector_type: ConnectorType::Ccs,
    }
}

/// Pull `chargingStation.id` out of every entry of a station listing
pub fn extract_station_ids(listing: &Value) -> Option<Vec<ResourceId>> {
    let entries = listing.as_array()?;
    Some(
        entries
            .iter()
            .filter_map(|entry| entry.get("chargingStation"))
            .filter_map(|station| ResourceId::from_field(station, "id"))
            .collect(),
    )
}

/// Register, authenticate, then collect stations and create a vehicle
pub async fn provision<D: Draws>(
    client: &ApiClient,
    draws: &mut D,
) -> Result<SetupContext, SetupError> {
    let identity = authenticate(client).await?;

    let station_ids = fetch_station_ids(client).await;
    let vehicle_ids = create_vehicle(client, &identity.token, draws).await;

    info!(
        "Setup complete: user={}, stations={}, vehicles={}",
        identity.email,
        station_ids.len(),
        vehicle_ids.len()
    );

    Ok(SetupContext {
        auth_token: identity.token,
        station_ids,
        vehicle_ids,
        test_user_id: identity.user_id,
    })
}

/// Steps 1 and 2: both are hard preconditions for the run
async fn authenticate(client: &ApiClient) -> Result<TestIdentity, SetupError> {
    let user = test_user(chrono::Utc::now().timestamp_millis());

    let created = client
        .post(paths::REGISTER_USER, Some(&user), None, None)
        .await;
    if !created.is_status(StatusCode::CREATED) {
        return Err(SetupError::UserCreation(created.status_code()));
    }
    info!("Registered test user {}", user.email);

    let credentials = Credentials {
        email: user.email.clone(),
        password: user.password.clone(),
    };
    let login = client
        .post(paths::LOGIN, Some(&credentials), None, None)
        .await;
    if !login.is_status(StatusCode::OK) {
        return Err(SetupError::Login(login.status_code()));
    }
    let session: LoginResponse = login.json().map_err(SetupError::MalformedLogin)?;

    Ok(TestIdentity {
        name: user.name,
        email: user.email,
        password: user.password,
        token: session.token,
        user_id: session.id,
    })
}

/// Step 3: a failure leaves the run with no stations
async fn fetch_station_ids(client: &ApiClient) -> Vec<ResourceId> {
    let resp = client.get(paths::STATIONS_ALL, None, None).await;
    if !resp.is_status(StatusCode::OK) {
        warn!(
            "Station listing failed (HTTP {}), continuing without stations",
            resp.status_code()
        );
        return Vec::new();
    }

    match resp.json::<Value>().ok().as_ref().and_then(extract_station_ids) {
        Some(ids) => ids,
        None => {
            warn!("Station listing is not a JSON array, continuing without stations");
            Vec::new()
        }
    }
}

/// Step 4: a failure leaves the run with no vehicles
///
/// A 200 without an id still counts as a created vehicle, so the pool is
/// non-empty and the vehicle scenario keeps its list/create split.
async fn create_vehicle<D: Draws>(
    client: &ApiClient,
    token: &str,
    draws: &mut D,
) -> Vec<Option<ResourceId>> {
    let payload = setup_vehicle(draws);
    let resp = client
        .post(paths::VEHICLES, Some(&payload), Some(token), None)
        .await;
    if !resp.is_status(StatusCode::OK) {
        warn!(
            "Vehicle creation failed (HTTP {}), continuing without vehicles",
            resp.status_code()
        );
        return Vec::new();
    }

    let id = resp
        .json::<Value>()
        .ok()
        .and_then(|body| ResourceId::from_field(&body, "id"));
    if id.is_none() {
        warn!("Vehicle creation response carries no id");
    }
    vec![id]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draws::ScriptedDraws;
    use serde_json::json;

    #[test]
    fn test_user_is_time_seeded() {
        let user = test_user(1_700_000_000_123);
        assert_eq!(user.name, "LoadTestUser_1700000000123");
        assert_eq!(user.email, "loadtest_1700000000123@example.com");
        assert_eq!(user.password, TEST_PASSWORD);
    }

    #[test]
    fn test_setup_vehicle_plate() {
        let mut draws = ScriptedDraws::new([0.123_45]);
        let vehicle = setup_vehicle(&mut draws);
        assert_eq!(vehicle.license_plate, "TEST_12345");
        assert_eq!(vehicle.brand, "Tesla");
        assert_eq!(vehicle.model, "Model S");
        assert_eq!(vehicle.connector_type, ConnectorType::Ccs);
    }

    #[test]
    fn test_extract_station_ids_filters_missing() {
        let listing = json!([
            {"chargingStation": {"id": 1}},
            {"chargingStation": {"id": null}},
            {"chargingStation": {}},
            {"spots": []},
            {"chargingStation": {"id": "abc"}},
        ]);
        let ids = extract_station_ids(&listing).unwrap();
        assert_eq!(ids, vec![ResourceId::from(1u64), ResourceId::from("abc")]);
    }

    #[test]
    fn test_extract_station_ids_requires_array() {
        assert!(extract_station_ids(&json!({"items": []})).is_none());
        assert_eq!(extract_station_ids(&json!([])), Some(Vec::new()));
    }
}
