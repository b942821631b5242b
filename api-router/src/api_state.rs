use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use common::{storage::db::SurrealDbClient, utils::config::AppConfig};
use retrieval_pipeline::{cache::SearchCache, SearchEngine};
use sync_pipeline::SyncPipeline;

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub config: AppConfig,
    pub engine: Arc<SearchEngine>,
    pub pipeline: Arc<SyncPipeline>,
    pub cache: Arc<SearchCache>,
    pub openai_client: Arc<async_openai::Client<OpenAIConfig>>,
}

impl ApiState {
    pub fn new(
        config: &AppConfig,
        db: Arc<SurrealDbClient>,
        engine: Arc<SearchEngine>,
        pipeline: Arc<SyncPipeline>,
        cache: Arc<SearchCache>,
        openai_client: Arc<async_openai::Client<OpenAIConfig>>,
    ) -> Self {
        Self {
            db,
            config: config.clone(),
            engine,
            pipeline,
            cache,
            openai_client,
        }
    }
}
