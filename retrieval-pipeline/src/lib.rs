pub mod answer;
pub mod cache;
pub mod scoring;

use std::sync::Arc;

use common::{
    error::AppError,
    storage::{db::SurrealDbClient, types::content_item::ContentItem},
    utils::{embedding::EmbeddingProvider, text::normalize_query},
};
use tracing::{debug, instrument};

pub use cache::SearchCache;
pub use scoring::RankedItem;

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Ranks the synced corpus against query embeddings, with a read-through
/// result cache keyed by normalized query text.
#[derive(Clone)]
pub struct SearchEngine {
    db: Arc<SurrealDbClient>,
    embedding_provider: Arc<EmbeddingProvider>,
    cache: Arc<SearchCache>,
    max_query_chars: usize,
}

impl SearchEngine {
    pub fn new(
        db: Arc<SurrealDbClient>,
        embedding_provider: Arc<EmbeddingProvider>,
        cache: Arc<SearchCache>,
        max_query_chars: usize,
    ) -> Self {
        Self {
            db,
            embedding_provider,
            cache,
            max_query_chars,
        }
    }

    /// Primary entry point for a search request.
    ///
    /// A cached result set is served as-is. On a miss the query is embedded,
    /// every stored item is scored, and the trimmed ranking is cached under
    /// the normalized query. Embedding failures abort the request; the
    /// caller decides how to degrade.
    #[instrument(skip_all, fields(limit = limit))]
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<RankedItem>, AppError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("Query must not be empty".to_string()));
        }
        if trimmed.chars().count() > self.max_query_chars {
            return Err(AppError::Validation(format!(
                "Query exceeds {} characters",
                self.max_query_chars
            )));
        }

        let key = normalize_query(trimmed);
        if let Some(results) = self.cache.get(&key).await {
            debug!(results = results.len(), "serving search from cache");
            return Ok(results);
        }

        let query_embedding = self.embedding_provider.embed(trimmed).await?;
        let items = self.db.get_all_stored_items::<ContentItem>().await?;
        let candidates = items.len();

        let results = scoring::rank(items, &query_embedding, limit);
        debug!(candidates, results = results.len(), "ranked corpus for query");

        self.cache.put(&key, results.clone()).await;
        Ok(results)
    }

    pub fn cache(&self) -> &Arc<SearchCache> {
        &self.cache
    }
}
