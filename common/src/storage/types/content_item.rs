use crate::{
    error::AppError, storage::db::SurrealDbClient, stored_object, utils::text::sha256_hex,
};

stored_object!(ContentItem, "content_item", {
    external_id: String,
    title: String,
    slug: String,
    excerpt: String,
    body: String,
    category: String,
    tags: Vec<String>,
    priority: i64,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    content_hash: String,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime",
        default
    )]
    synced_at: DateTime<Utc>
});

/// Normalized source fields for one item, as produced by the sync pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFields {
    pub external_id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub body: String,
    pub category: String,
    pub tags: Vec<String>,
}

impl ContentFields {
    pub fn embedding_input(&self) -> String {
        compose_embedding_input(&self.title, &self.category, &self.tags, &self.excerpt)
    }

    /// Digest of the fields the embedding is derived from. A changed digest
    /// is what marks an item for re-embedding.
    pub fn content_hash(&self) -> String {
        sha256_hex(&self.embedding_input())
    }
}

fn compose_embedding_input(title: &str, category: &str, tags: &[String], excerpt: &str) -> String {
    format!(
        "title: {}, category: {}, tags: {}, excerpt: {}",
        title,
        category,
        tags.join(", "),
        excerpt
    )
}

/// Result of one upsert: the stored record plus whether its embedded
/// fields differ from what was stored before.
#[derive(Debug, Deserialize)]
pub struct UpsertOutcome {
    pub item: ContentItem,
    pub changed: bool,
}

impl ContentItem {
    pub fn embedding_input(&self) -> String {
        compose_embedding_input(&self.title, &self.category, &self.tags, &self.excerpt)
    }

    /// Inserts or refreshes one item keyed by its external id.
    ///
    /// Re-running the same payload is a no-op apart from `synced_at`.
    /// `priority` and `embedding` are local state and survive refreshes,
    /// except that a changed content hash clears the embedding so the
    /// next backfill regenerates it from the new text.
    pub async fn upsert_from_source(
        db: &SurrealDbClient,
        fields: ContentFields,
        synced_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, AppError> {
        let content_hash = fields.content_hash();
        let now = surrealdb::sql::Datetime::from(Utc::now());

        let mut response = db
            .client
            .query(
                "UPSERT type::thing($table, $id) SET
                    embedding = IF content_hash = $content_hash THEN embedding ELSE NONE END,
                    external_id = $external_id,
                    title = $title,
                    slug = $slug,
                    excerpt = $excerpt,
                    body = $body,
                    category = $category,
                    tags = $tags,
                    content_hash = $content_hash,
                    priority = priority ?? 0,
                    synced_at = $synced_at,
                    created_at = created_at ?? $now,
                    updated_at = $now
                RETURN VALUE {
                    item: $after,
                    changed: $before.content_hash != $content_hash
                }",
            )
            .bind(("table", Self::table_name()))
            .bind(("id", fields.external_id.clone()))
            .bind(("external_id", fields.external_id))
            .bind(("title", fields.title))
            .bind(("slug", fields.slug))
            .bind(("excerpt", fields.excerpt))
            .bind(("body", fields.body))
            .bind(("category", fields.category))
            .bind(("tags", fields.tags))
            .bind(("content_hash", content_hash))
            .bind(("synced_at", surrealdb::sql::Datetime::from(synced_at)))
            .bind(("now", now))
            .await?;

        let outcome: Option<UpsertOutcome> = response.take(0)?;
        outcome.ok_or(AppError::Validation(
            "Failed to upsert content item".to_string(),
        ))
    }

    /// Sets the ranking priority of one item. Fails with `NotFound` for
    /// unknown external ids rather than creating a record.
    pub async fn set_priority(
        db: &SurrealDbClient,
        external_id: &str,
        priority: i64,
    ) -> Result<Self, AppError> {
        let updated: Option<Self> = db
            .client
            .query(
                "UPDATE type::thing($table, $id)
                SET priority = $priority,
                    updated_at = $now
                RETURN AFTER",
            )
            .bind(("table", Self::table_name()))
            .bind(("id", external_id.to_string()))
            .bind(("priority", priority))
            .bind(("now", surrealdb::sql::Datetime::from(Utc::now())))
            .await?
            .take(0)?;

        updated.ok_or(AppError::NotFound(format!(
            "No content item with external id {external_id}"
        )))
    }

    /// Stores an embedding for one item, but only while the content it was
    /// derived from is still current. Returns whether the write applied.
    pub async fn set_embedding(
        db: &SurrealDbClient,
        external_id: &str,
        content_hash: &str,
        embedding: Vec<f32>,
    ) -> Result<bool, AppError> {
        let updated: Option<Self> = db
            .client
            .query(
                "UPDATE type::thing($table, $id)
                SET embedding = $embedding,
                    updated_at = $now
                WHERE content_hash = $content_hash
                RETURN AFTER",
            )
            .bind(("table", Self::table_name()))
            .bind(("id", external_id.to_string()))
            .bind(("embedding", embedding))
            .bind(("content_hash", content_hash.to_string()))
            .bind(("now", surrealdb::sql::Datetime::from(Utc::now())))
            .await?
            .take(0)?;

        Ok(updated.is_some())
    }

    /// Items awaiting an embedding, oldest first.
    pub async fn missing_embeddings(db: &SurrealDbClient) -> Result<Vec<Self>, AppError> {
        let items: Vec<Self> = db
            .client
            .query("SELECT * FROM type::table($table) WHERE embedding = NONE ORDER BY updated_at ASC")
            .bind(("table", Self::table_name()))
            .await?
            .take(0)?;

        Ok(items)
    }

    /// Deletes items last confirmed by the source before `cutoff`.
    /// Only called after a sync run that walked the full corpus.
    pub async fn prune_not_seen_since(
        db: &SurrealDbClient,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, AppError> {
        let removed: Vec<Self> = db
            .client
            .query("DELETE type::table($table) WHERE synced_at < $cutoff RETURN BEFORE")
            .bind(("table", Self::table_name()))
            .bind(("cutoff", surrealdb::sql::Datetime::from(cutoff)))
            .await?
            .take(0)?;

        Ok(removed.len())
    }
}
