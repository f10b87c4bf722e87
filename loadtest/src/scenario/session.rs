//! Charging session lookup and booking

use chrono::{DateTime, Datelike, Duration, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::client::{ApiClient, EntityRef, ResourceId, SessionPayload, paths};
use crate::draws::Draws;
use crate::metrics::Category;
use crate::setup::SetupContext;

/// Share of session iterations that only list sessions (the rest book one)
pub const LIST_SHARE: f64 = 0.6;

/// Booked session length bounds in seconds, inclusive
pub const MIN_DURATION_SECS: u64 = 600;
pub const MAX_DURATION_SECS: u64 = 2399;

const OFFSET_WINDOW_MS: u64 = 30 * 24 * 60 * 60 * 1000;

/// Start time for a booking: 1-60 days ahead plus a random offset of up to 30 days
///
/// The day-of-month is set on the already-offset date, so the month the
/// offset lands in shifts the result. The resulting distribution is not
/// uniform and reaches roughly 90 days out.
pub fn random_start_time<D: Draws>(now: DateTime<Utc>, draws: &mut D) -> DateTime<Utc> {
    let days_ahead = draws.below(60) as i64 + 1;
    let offset_ms = draws.below(OFFSET_WINDOW_MS) as i64;

    let shifted = now + Duration::milliseconds(offset_ms);
    let month_start = shifted - Duration::days(shifted.day0() as i64);
    month_start + Duration::days(now.day() as i64 + days_ahead - 1)
}

/// Booking body for a random vehicle and station
pub fn booking<D: Draws>(
    vehicle: &Value,
    station_id: Option<ResourceId>,
    now: DateTime<Utc>,
    draws: &mut D,
) -> SessionPayload {
    let start = random_start_time(now, draws);
    SessionPayload {
        charging_spot: EntityRef { id: station_id },
        vehicle: EntityRef {
            id: ResourceId::from_field(vehicle, "id"),
        },
        start_time: start.to_rfc3339_opts(SecondsFormat::Millis, true),
        duration: draws.int_in(MIN_DURATION_SECS, MAX_DURATION_SECS),
    }
}

pub async fn run<D: Draws>(ctx: &SetupContext, client: &ApiClient, draws: &mut D) {
    if ctx.station_ids.is_empty() {
        return;
    }

    if draws.unit() < LIST_SHARE {
        let resp = client
            .get(
                paths::SESSIONS,
                Some(ctx.auth_token.as_str()),
                Some(Category::Session),
            )
            .await;
        let success = resp.is_status(StatusCode::OK);
        client
            .metrics()
            .record(Category::Session, resp.elapsed, success);
    } else {
        book(ctx, client, draws).await;
    }
}

/// Book a session with one of the user's vehicles
///
/// Early exits record no session metric: an unusable vehicle list and a
/// rejected booking both end the iteration silently.
async fn book<D: Draws>(ctx: &SetupContext, client: &ApiClient, draws: &mut D) {
    let token = Some(ctx.auth_token.as_str());

    let vehicles_resp = client
        .get(paths::VEHICLES, token, Some(Category::Vehicle))
        .await;
    let mut vehicles = Value::Array(Vec::new());
    if vehicles_resp.is_status(StatusCode::OK) {
        match vehicles_resp.json::<Value>() {
            Ok(body) => vehicles = body,
            Err(e) => {
                error!(
                    "Failed to parse vehicle list ({}): {}",
                    e,
                    vehicles_resp.text()
                );
                return;
            }
        }
    }
    let Some(vehicles) = vehicles.as_array().filter(|v| !v.is_empty()) else {
        warn!("Test user has no vehicles to book a session with");
        return;
    };

    let Some(vehicle) = draws.pick(vehicles) else {
        return;
    };
    let station_id = draws.pick(&ctx.station_ids).cloned();
    let payload = booking(vehicle, station_id, Utc::now(), draws);

    let resp = client
        .post(paths::SESSIONS, Some(&payload), token, Some(Category::Session))
        .await;
    if !resp.is_status(StatusCode::OK) {
        debug!("Session booking rejected: HTTP {}", resp.status_code());
        return;
    }

    let success = resp.is_status(StatusCode::OK) && resp.has_field("id");
    client
        .metrics()
        .record(Category::Session, resp.elapsed, success);
}
