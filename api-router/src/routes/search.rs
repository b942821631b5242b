use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use retrieval_pipeline::{RankedItem, DEFAULT_SEARCH_LIMIT};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::{api_state::ApiState, error::ApiError, routes::record_query};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

/// Wire shape of one search result. Embeddings and sync bookkeeping stay
/// internal; callers get the fields a results page needs.
#[derive(Debug, Serialize)]
pub(crate) struct SearchHit {
    pub score: f32,
    pub external_id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub priority: i64,
}

impl From<&RankedItem> for SearchHit {
    fn from(ranked: &RankedItem) -> Self {
        Self {
            score: ranked.score,
            external_id: ranked.item.external_id.clone(),
            title: ranked.item.title.clone(),
            slug: ranked.item.slug.clone(),
            excerpt: ranked.item.excerpt.clone(),
            category: ranked.item.category.clone(),
            tags: ranked.item.tags.clone(),
            priority: ranked.item.priority,
        }
    }
}

pub async fn search(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let results = state
        .engine
        .search(&params.q, params.limit)
        .await
        .map_err(|err| {
            error!(query = %params.q, error = %err, "Search request failed");
            ApiError::from(err)
        })?;

    record_query(&state, &headers, &params.q, results.len());

    let hits: Vec<SearchHit> = results.iter().map(SearchHit::from).collect();
    Ok(Json(json!({ "results": hits })))
}
