use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Which backend produces embedding vectors.
#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Remote OpenAI-compatible embeddings endpoint.
    #[default]
    OpenAI,
    /// Deterministic local token-bucket vectors, for tests and offline runs.
    Hashed,
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub surrealdb_address: String,
    pub surrealdb_username: String,
    pub surrealdb_password: String,
    pub surrealdb_namespace: String,
    pub surrealdb_database: String,
    pub http_port: u16,
    /// Base URL of the remote publishing API the sync pipeline reads from.
    pub content_source_url: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default)]
    pub embedding_backend: EmbeddingBackend,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: u32,
    #[serde(default = "default_query_model")]
    pub query_model: String,
    #[serde(default = "default_sync_page_size")]
    pub sync_page_size: u32,
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    #[serde(default = "default_search_cache_ttl_secs")]
    pub search_cache_ttl_secs: u64,
    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
    /// Static key guarding the admin routes. Unset leaves them open,
    /// which is only sensible on private deployments.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Remove local items the source no longer lists, after a clean run.
    #[serde(default)]
    pub prune_missing: bool,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> u32 {
    1536
}

fn default_query_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_sync_page_size() -> u32 {
    50
}

fn default_sync_interval_secs() -> u64 {
    6 * 60 * 60
}

fn default_search_cache_ttl_secs() -> u64 {
    60 * 60
}

fn default_embed_timeout_secs() -> u64 {
    20
}

fn default_max_query_chars() -> usize {
    512
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
