//! Common Test Utilities for Integration Tests
//!
//! An in-process stand-in for the charging backend. Every request is recorded
//! so tests can assert on exactly which calls a scenario made.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use charging_loadtest::client::ApiClient;
use charging_loadtest::metrics::Metrics;
use serde_json::{Value, json};

pub const TOKEN: &str = "T";

/// Canned responses, one per endpoint
#[derive(Debug, Clone)]
pub struct Behavior {
    pub register: (u16, Value),
    pub login: (u16, String),
    pub stations: (u16, Value),
    pub station_filter: (u16, Value),
    pub vehicle_create: (u16, Value),
    pub vehicle_list: (u16, String),
    pub session_list: (u16, Value),
    pub session_create: (u16, Value),
    pub payment_intent: (u16, Value),
    /// Added before answering the station listing
    pub stations_delay: Duration,
    /// Added before answering the station filter
    pub station_filter_delay: Duration,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            register: (201, json!({"id": 77})),
            login: (200, json!({"token": TOKEN, "id": 77}).to_string()),
            stations: (
                200,
                json!([
                    {"chargingStation": {"id": 1, "name": "North"}},
                    {"chargingStation": {"id": null}},
                    {"chargingStation": {"id": "st-2"}},
                    {"other": true}
                ]),
            ),
            station_filter: (200, json!([])),
            vehicle_create: (200, json!({"id": uuid::Uuid::new_v4().to_string()})),
            vehicle_list: (200, json!([{"id": 9, "brand": "Tesla"}]).to_string()),
            session_list: (200, json!([])),
            session_create: (200, json!({"id": "sess-1"})),
            payment_intent: (200, json!({"clientSecret": "pi_secret"})),
            stations_delay: Duration::ZERO,
            station_filter_delay: Duration::ZERO,
        }
    }
}

/// A request the mock backend received
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    /// Path including the query string
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

struct MockState {
    behavior: Behavior,
    calls: Mutex<Vec<RecordedCall>>,
}

pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start(behavior: Behavior) -> Self {
        let state = Arc::new(MockState {
            behavior,
            calls: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.calls.lock().unwrap().len()
    }

    /// Client pointed at this backend, with a fresh metric registry
    pub fn client(&self) -> (ApiClient, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new());
        let client = ApiClient::new(&self.base_url, Duration::from_secs(5), metrics.clone())
            .expect("client should build");
        (client, metrics)
    }
}

fn reply(status: u16, body: String) -> Response {
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    state.calls.lock().unwrap().push(RecordedCall {
        method: method.clone(),
        path,
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    });

    let b = &state.behavior;
    let route = uri.path();
    match (method.as_str(), route) {
        ("POST", "/api/v1/public/user-table") => reply(b.register.0, b.register.1.to_string()),
        ("POST", "/api/v1/public/user-table/login") => reply(b.login.0, b.login.1.clone()),
        ("GET", "/api/v1/public/charging-stations/all") => {
            tokio::time::sleep(b.stations_delay).await;
            reply(b.stations.0, b.stations.1.to_string())
        }
        ("GET", "/api/v1/public/charging-stations/filter") => {
            tokio::time::sleep(b.station_filter_delay).await;
            reply(b.station_filter.0, b.station_filter.1.to_string())
        }
        ("POST", "/api/v1/private/vehicles") => {
            reply(b.vehicle_create.0, b.vehicle_create.1.to_string())
        }
        ("GET", "/api/v1/private/vehicles") => {
            reply(b.vehicle_list.0, b.vehicle_list.1.clone())
        }
        ("GET", "/api/v1/private/session") => {
            reply(b.session_list.0, b.session_list.1.to_string())
        }
        ("POST", "/api/v1/private/session") => {
            reply(b.session_create.0, b.session_create.1.to_string())
        }
        ("POST", p) if p.starts_with("/api/v1/private/payment/create-intent/") => {
            reply(b.payment_intent.0, b.payment_intent.1.to_string())
        }
        _ => reply(404, json!({"error": "not found"}).to_string()),
    }
}
