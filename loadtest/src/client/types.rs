//! Request and response bodies exchanged with the charging backend

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque identifier taken from a backend response
///
/// The backend may use numeric or string ids; the value is passed back
/// untouched when building later requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Value);

impl ResourceId {
    /// Accept a JSON value as an id unless it is missing or falsy
    /// (`null`, `false`, `0`, `""`, or a non-scalar)
    pub fn from_json(value: &Value) -> Option<Self> {
        let usable = match value {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            _ => false,
        };
        usable.then(|| Self(value.clone()))
    }

    /// Id stored under `field` in a JSON object
    pub fn from_field(object: &Value, field: &str) -> Option<Self> {
        object.get(field).and_then(Self::from_json)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(Value::String(s.to_string()))
    }
}

impl From<u64> for ResourceId {
    fn from(n: u64) -> Self {
        Self(Value::from(n))
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

/// Charger plug standards known to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorType {
    #[serde(rename = "CCS")]
    Ccs,
    #[serde(rename = "CHADEMO")]
    Chademo,
    #[serde(rename = "MENNEKES")]
    Mennekes,
    #[serde(rename = "SAEJ1772")]
    SaeJ1772,
}

impl ConnectorType {
    /// Connector types used when filtering stations
    pub const FILTERABLE: [ConnectorType; 4] = [
        ConnectorType::Ccs,
        ConnectorType::Chademo,
        ConnectorType::Mennekes,
        ConnectorType::SaeJ1772,
    ];

    /// Connector types given to vehicles created during the run
    pub const VEHICLE: [ConnectorType; 2] = [ConnectorType::Chademo, ConnectorType::Ccs];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorType::Ccs => "CCS",
            ConnectorType::Chademo => "CHADEMO",
            ConnectorType::Mennekes => "MENNEKES",
            ConnectorType::SaeJ1772 => "SAEJ1772",
        }
    }
}

/// Registration body for the test identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Successful login response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub id: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePayload {
    pub brand: String,
    pub model: String,
    pub license_plate: String,
    pub connector_type: ConnectorType,
}

/// `{ "id": ... }` reference to another entity; an unknown id serializes as `{}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
}

/// Session booking body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub charging_spot: EntityRef,
    pub vehicle: EntityRef,
    pub start_time: String,
    /// Seconds
    pub duration: u64,
}

/// Flat session body used ahead of a payment intent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickSessionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging_spot_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<ResourceId>,
    pub start_time: String,
}
