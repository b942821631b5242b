use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use common::storage::types::query_stat::QueryStat;
use serde::Deserialize;
use serde_json::json;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct TopQueriesParams {
    #[serde(default = "default_top_limit")]
    pub limit: usize,
}

fn default_top_limit() -> usize {
    10
}

/// Most frequent queries, for the operator dashboard.
pub async fn top_queries(
    State(state): State<ApiState>,
    Query(params): Query<TopQueriesParams>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = QueryStat::top(&state.db, params.limit).await?;

    Ok(Json(json!({ "queries": stats })))
}
