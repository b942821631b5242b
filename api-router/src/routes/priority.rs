use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use common::storage::types::content_item::ContentItem;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct PriorityUpdate {
    pub priority: i64,
}

/// Editorial boost control for one item, keyed by its upstream id.
pub async fn set_priority(
    State(state): State<ApiState>,
    Path(external_id): Path<String>,
    Json(update): Json<PriorityUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let item = ContentItem::set_priority(&state.db, &external_id, update.priority).await?;

    // Priority feeds directly into ranking scores, so every cached result
    // set is stale the moment it changes.
    state.cache.invalidate_all().await;

    info!(external_id = %item.external_id, priority = item.priority, "Updated content priority");

    Ok(Json(json!({
        "external_id": item.external_id,
        "priority": item.priority,
    })))
}
