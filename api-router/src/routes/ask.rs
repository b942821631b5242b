use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use common::error::AppError;
use retrieval_pipeline::{
    answer::{generate_answer, FALLBACK_ANSWER},
    DEFAULT_SEARCH_LIMIT,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{
    api_state::ApiState,
    error::ApiError,
    routes::{record_query, search::SearchHit},
};

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Question answering over the synced corpus.
///
/// Malformed questions are the caller's fault and come back as 400.
/// Anything that breaks on our side degrades to a 200 with an apology,
/// so embedding or model outages never surface as errors on the page.
pub async fn ask(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let results = match state
        .engine
        .search(&request.question, DEFAULT_SEARCH_LIMIT)
        .await
    {
        Ok(results) => results,
        Err(err @ AppError::Validation(_)) => return Err(ApiError::from(err)),
        Err(err) => {
            error!(question = %request.question, error = %err, "Retrieval failed; serving fallback answer");
            record_query(&state, &headers, &request.question, 0);
            return Ok(Json(json!({
                "answer": FALLBACK_ANSWER,
                "results": [],
            })));
        }
    };

    let answer = match generate_answer(
        &state.openai_client,
        &state.config.query_model,
        &request.question,
        &results,
    )
    .await
    {
        Ok(answer) => answer,
        Err(err) => {
            error!(question = %request.question, error = %err, "Answer generation failed; serving fallback answer");
            FALLBACK_ANSWER.to_string()
        }
    };

    record_query(&state, &headers, &request.question, results.len());

    let hits: Vec<SearchHit> = results.iter().map(SearchHit::from).collect();
    Ok(Json(json!({
        "answer": answer,
        "results": hits,
    })))
}
