use std::{sync::Arc, time::Duration};

use api_router::{api_routes_v1, api_state::ApiState};
use axum::{extract::FromRef, Router};
use common::{
    storage::db::SurrealDbClient,
    utils::{config::get_config, embedding::EmbeddingProvider},
};
use retrieval_pipeline::{cache::SearchCache, SearchEngine};
use sync_pipeline::{run_sync_scheduler, HttpContentSource, SyncPipeline};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let db = Arc::new(
        SurrealDbClient::new(
            &config.surrealdb_address,
            &config.surrealdb_username,
            &config.surrealdb_password,
            &config.surrealdb_namespace,
            &config.surrealdb_database,
        )
        .await?,
    );

    // Ensure db is initialized
    db.ensure_initialized().await?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let embedding_provider = Arc::new(EmbeddingProvider::from_config(
        &config,
        Some(openai_client.clone()),
    )?);
    info!(
        embedding_backend = ?config.embedding_backend,
        embedding_dimension = embedding_provider.dimension(),
        "Embedding provider initialized"
    );

    let cache = Arc::new(SearchCache::new(Duration::from_secs(
        config.search_cache_ttl_secs,
    )));
    let engine = Arc::new(SearchEngine::new(
        db.clone(),
        embedding_provider.clone(),
        cache.clone(),
        config.max_query_chars,
    ));

    let source = Arc::new(HttpContentSource::new(&config.content_source_url)?);
    let pipeline = Arc::new(SyncPipeline::new(
        db.clone(),
        source,
        embedding_provider,
        cache.clone(),
        config.sync_page_size,
        config.prune_missing,
    ));

    // One sync at startup, then one per interval. Manual /sync triggers
    // share the pipeline's single-flight guard with the scheduler.
    tokio::spawn(run_sync_scheduler(
        pipeline.clone(),
        Duration::from_secs(config.sync_interval_secs),
    ));

    let api_state = ApiState::new(&config, db, engine, pipeline, cache, openai_client);

    // Create Axum router
    let app = Router::new()
        .nest("/api/v1", api_routes_v1(&api_state))
        .with_state(AppState { api_state });

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Clone, FromRef)]
struct AppState {
    api_state: ApiState,
}
