//! Unauthenticated station browsing

use std::time::Duration;

use reqwest::StatusCode;

use crate::client::{ApiClient, ConnectorType, paths};
use crate::draws::Draws;
use crate::metrics::Category;

/// Share of public iterations that list every station (the rest filter)
pub const LIST_ALL_SHARE: f64 = 0.7;

/// Listing slower than this counts as a failed sample
pub const LIST_ALL_BUDGET: Duration = Duration::from_millis(2000);

pub async fn run<D: Draws>(client: &ApiClient, draws: &mut D) {
    if draws.unit() < LIST_ALL_SHARE {
        let resp = client
            .get(paths::STATIONS_ALL, None, Some(Category::Public))
            .await;
        let success = resp.is_status(StatusCode::OK) && resp.elapsed < LIST_ALL_BUDGET;
        client
            .metrics()
            .record(Category::Public, resp.elapsed, success);
    } else {
        let connector = draws
            .pick(&ConnectorType::FILTERABLE)
            .copied()
            .unwrap_or(ConnectorType::Ccs);
        let resp = client
            .get(
                &paths::stations_filter(connector),
                None,
                Some(Category::Public),
            )
            .await;
        let success = resp.is_status(StatusCode::OK);
        client
            .metrics()
            .record(Category::Public, resp.elapsed, success);
    }
}
