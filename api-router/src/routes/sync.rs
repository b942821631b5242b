use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use crate::{api_state::ApiState, error::ApiError};

/// Kicks off a sync run and waits for its report.
///
/// Runs are single-flight; a trigger that lands while one is active is
/// rejected with a conflict instead of queueing a second walk.
pub async fn trigger_sync(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    match state.pipeline.try_sync().await {
        Some(Ok(report)) => Ok(Json(json!({
            "status": "ok",
            "report": report,
        }))),
        Some(Err(err)) => {
            error!(error = %err, "Triggered sync run failed");
            Err(ApiError::from(err))
        }
        None => Err(ApiError::Conflict(
            "A sync run is already in progress".to_string(),
        )),
    }
}
