use std::{sync::Arc, time::Duration};

use common::{
    storage::db::SurrealDbClient,
    utils::{config::get_config, embedding::EmbeddingProvider},
};
use retrieval_pipeline::cache::SearchCache;
use sync_pipeline::{run_sync_scheduler, HttpContentSource, SyncPipeline};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

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

    db.ensure_initialized().await?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let embedding_provider =
        Arc::new(EmbeddingProvider::from_config(&config, Some(openai_client))?);

    // No HTTP surface here. The cache only absorbs the pipeline's
    // invalidation calls; server processes bound staleness with their
    // own cache TTL.
    let cache = Arc::new(SearchCache::new(Duration::from_secs(
        config.search_cache_ttl_secs,
    )));

    let source = Arc::new(HttpContentSource::new(&config.content_source_url)?);
    let pipeline = Arc::new(SyncPipeline::new(
        db,
        source,
        embedding_provider,
        cache,
        config.sync_page_size,
        config.prune_missing,
    ));

    info!(
        interval_secs = config.sync_interval_secs,
        "Starting sync worker"
    );
    run_sync_scheduler(
        pipeline,
        Duration::from_secs(config.sync_interval_secs),
    )
    .await;

    Ok(())
}
