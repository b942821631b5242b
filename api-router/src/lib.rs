use api_state::ApiState;
use axum::{
    extract::FromRef,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use middleware_api_auth::api_auth;
use routes::{
    ask::ask, liveness::live, priority::set_priority, readiness::ready, search::search,
    sync::trigger_sync, top_queries::top_queries,
};

pub mod api_state;
pub mod error;
mod middleware_api_auth;
mod routes;

/// Router for API functionality, version 1
pub fn api_routes_v1<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Public endpoints: probes plus the two reader-facing surfaces that
    // the published site calls directly.
    let public = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live))
        .route("/search", get(search))
        .route("/ask", post(ask));

    // Operator endpoints (require auth when an API key is configured)
    let protected = Router::new()
        .route("/sync", post(trigger_sync))
        .route("/content/{external_id}/priority", put(set_priority))
        .route("/queries/top", get(top_queries))
        .route_layer(from_fn_with_state(app_state.clone(), api_auth));

    public.merge(protected)
}
