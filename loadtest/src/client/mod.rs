//! Client side of the charging backend API
//!
//! This module provides:
//! - `ApiClient`, a pooled HTTP client that times and tags every call
//! - Typed request/response bodies
//! - The backend's endpoint paths

mod http;
pub mod types;

pub use http::{ApiClient, ApiResponse};
pub use types::{
    ConnectorType, Credentials, EntityRef, LoginResponse, NewUser, QuickSessionPayload,
    ResourceId, SessionPayload, VehiclePayload,
};

/// Endpoint paths, relative to the base URL
pub mod paths {
    use super::ResourceId;
    use super::types::ConnectorType;

    pub const REGISTER_USER: &str = "/api/v1/public/user-table";
    pub const LOGIN: &str = "/api/v1/public/user-table/login";
    pub const STATIONS_ALL: &str = "/api/v1/public/charging-stations/all";
    pub const STATIONS_FILTER: &str = "/api/v1/public/charging-stations/filter";
    pub const VEHICLES: &str = "/api/v1/private/vehicles";
    pub const SESSIONS: &str = "/api/v1/private/session";
    pub const PAYMENT_INTENT: &str = "/api/v1/private/payment/create-intent";

    pub fn stations_filter(connector: ConnectorType) -> String {
        format!(
            "{}?connectorTypeInputs={}",
            STATIONS_FILTER,
            connector.as_str()
        )
    }

    pub fn payment_intent(session_id: &ResourceId) -> String {
        format!("{}/{}", PAYMENT_INTENT, session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_path() {
        assert_eq!(
            paths::stations_filter(ConnectorType::SaeJ1772),
            "/api/v1/public/charging-stations/filter?connectorTypeInputs=SAEJ1772"
        );
    }

    #[test]
    fn test_payment_intent_path() {
        assert_eq!(
            paths::payment_intent(&ResourceId::from("s-9")),
            "/api/v1/private/payment/create-intent/s-9"
        );
    }
}
