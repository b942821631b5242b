use axum::http::{header::REFERER, HeaderMap};
use common::storage::types::query_event::QueryEvent;
use tracing::warn;

use crate::api_state::ApiState;

pub mod ask;
pub mod liveness;
pub mod priority;
pub mod readiness;
pub mod search;
pub mod sync;
pub mod top_queries;

/// Logs a served query into the analytics tables off the request path.
///
/// Analytics must never slow down or fail a response, so the write runs in
/// a detached task and only warns on failure.
pub(crate) fn record_query(
    state: &ApiState,
    headers: &HeaderMap,
    query: &str,
    result_count: usize,
) {
    let event = QueryEvent::new(
        query.to_string(),
        client_ip(headers),
        referring_page(headers),
        i64::try_from(result_count).unwrap_or(i64::MAX),
    );

    let db = state.db.clone();
    tokio::spawn(async move {
        if let Err(error) = event.record(&db).await {
            warn!(error = %error, "Failed to record query analytics");
        }
    });
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn referring_page(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}
