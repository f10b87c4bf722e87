//! Payment intent creation
//!
//! Not reachable from the dispatcher: the payment branch of an iteration is
//! currently a no-op. The handler is kept callable so it can be exercised on
//! its own and wired in once the backend's payment flow is ready.

use chrono::{SecondsFormat, Utc};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::warn;

use crate::client::{ApiClient, QuickSessionPayload, ResourceId, paths};
use crate::draws::Draws;
use crate::metrics::Category;
use crate::setup::SetupContext;

pub async fn run<D: Draws>(ctx: &SetupContext, client: &ApiClient, draws: &mut D) {
    let token = Some(ctx.auth_token.as_str());

    let payload = QuickSessionPayload {
        charging_spot_id: draws.pick(&ctx.station_ids).cloned(),
        vehicle_id: draws.pick(&ctx.vehicle_ids).cloned().flatten(),
        start_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let session = client
        .post(paths::SESSIONS, Some(&payload), token, None)
        .await;
    if !session.is_status(StatusCode::OK) {
        return;
    }

    let Some(session_id) = session
        .json::<Value>()
        .ok()
        .and_then(|body| ResourceId::from_field(&body, "id"))
    else {
        warn!("Temporary session for payment carries no id");
        return;
    };

    let resp = client
        .post(
            &paths::payment_intent(&session_id),
            None::<&()>,
            token,
            Some(Category::Payment),
        )
        .await;
    let success = resp.is_status(StatusCode::OK) && resp.has_field("clientSecret");
    client
        .metrics()
        .record(Category::Payment, resp.elapsed, success);
}
