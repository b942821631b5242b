use crate::{
    error::AppError, storage::db::SurrealDbClient, stored_object, utils::text::query_hash,
};

stored_object!(QueryStat, "query_stat", {
    query_text: String,
    count: i64,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime",
        default
    )]
    last_seen: DateTime<Utc>
});

impl QueryStat {
    /// Inserts or increments the aggregate row for a query, keyed by the
    /// digest of its normalized text. The whole step is one statement so
    /// concurrent requests never lose an increment.
    pub async fn bump(db: &SurrealDbClient, query_text: &str) -> Result<Self, AppError> {
        let hash = query_hash(query_text);
        let now = surrealdb::sql::Datetime::from(Utc::now());

        let updated: Option<Self> = db
            .client
            .query(
                "UPSERT type::thing($table, $hash) SET
                    query_text = query_text ?? $query_text,
                    count = (count ?? 0) + 1,
                    last_seen = $now,
                    created_at = created_at ?? $now,
                    updated_at = $now
                RETURN AFTER",
            )
            .bind(("table", Self::table_name()))
            .bind(("hash", hash))
            .bind(("query_text", query_text.trim().to_string()))
            .bind(("now", now))
            .await?
            .take(0)?;

        updated.ok_or(AppError::Validation(
            "Failed to update query statistics".to_string(),
        ))
    }

    /// Most frequent queries, ties broken by recency.
    pub async fn top(db: &SurrealDbClient, limit: usize) -> Result<Vec<Self>, AppError> {
        let stats: Vec<Self> = db
            .client
            .query(
                "SELECT * FROM type::table($table)
                ORDER BY count DESC, last_seen DESC
                LIMIT $limit",
            )
            .bind(("table", Self::table_name()))
            .bind(("limit", i64::try_from(limit).unwrap_or(i64::MAX)))
            .await?
            .take(0)?;

        Ok(stats)
    }
}
