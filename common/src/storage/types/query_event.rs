use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};
use uuid::Uuid;

use super::query_stat::QueryStat;

stored_object!(QueryEvent, "query_event", {
    query_text: String,
    source_ip: Option<String>,
    page: Option<String>,
    result_count: i64
});

impl QueryEvent {
    pub fn new(
        query_text: String,
        source_ip: Option<String>,
        page: Option<String>,
        result_count: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            query_text,
            source_ip,
            page,
            result_count,
        }
    }

    /// Appends the event and bumps the aggregate row for its query.
    pub async fn record(self, db: &SurrealDbClient) -> Result<QueryStat, AppError> {
        let query_text = self.query_text.clone();
        db.store_item(self).await?;

        QueryStat::bump(db, &query_text).await
    }
}
