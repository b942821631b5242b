use std::{sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::{info, warn};

use common::{
    error::AppError,
    storage::{db::SurrealDbClient, types::content_item::ContentItem},
    utils::embedding::EmbeddingProvider,
};
use retrieval_pipeline::SearchCache;

use crate::{normalize::normalize_entry, source::ContentSource};

/// Counters for one full synchronization run.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SyncReport {
    /// Items listed by the source across all pages.
    pub seen: u64,
    /// Items whose stored content actually changed, inserts included.
    pub upserted: u64,
    /// Embeddings generated and stored this run.
    pub embedded: u64,
    /// Items left unembedded for the next run after retries were exhausted.
    pub embedding_failures: u64,
}

/// Keeps the local replica aligned with the remote publishing source.
///
/// A run walks the listing page by page, upserts every item, then backfills
/// embeddings for whatever is missing one. Page fetch errors abort the run;
/// per-item embedding errors are counted and deferred instead.
pub struct SyncPipeline {
    db: Arc<SurrealDbClient>,
    source: Arc<dyn ContentSource>,
    embedding_provider: Arc<EmbeddingProvider>,
    cache: Arc<SearchCache>,
    page_size: u32,
    prune_missing: bool,
    run_guard: Mutex<()>,
}

impl SyncPipeline {
    pub fn new(
        db: Arc<SurrealDbClient>,
        source: Arc<dyn ContentSource>,
        embedding_provider: Arc<EmbeddingProvider>,
        cache: Arc<SearchCache>,
        page_size: u32,
        prune_missing: bool,
    ) -> Self {
        Self {
            db,
            source,
            embedding_provider,
            cache,
            page_size,
            prune_missing,
            run_guard: Mutex::new(()),
        }
    }

    /// Runs a sync unless one is already in flight, in which case nothing
    /// is fetched and `None` is returned.
    pub async fn try_sync(&self) -> Option<Result<SyncReport, AppError>> {
        let Ok(_guard) = self.run_guard.try_lock() else {
            info!("sync already in progress; skipping this trigger");
            return None;
        };

        Some(self.run().await)
    }

    /// Runs a full sync, waiting first for any in-flight run to finish.
    pub async fn sync(&self) -> Result<SyncReport, AppError> {
        let _guard = self.run_guard.lock().await;
        self.run().await
    }

    #[tracing::instrument(skip_all)]
    async fn run(&self) -> Result<SyncReport, AppError> {
        let run_started_at = Utc::now();
        let started = Instant::now();
        let mut report = SyncReport::default();

        let fetch_started = Instant::now();
        self.pull_pages(&mut report, run_started_at).await?;
        let fetch_duration_ms = duration_millis(fetch_started.elapsed());

        let embed_started = Instant::now();
        self.embed_missing(&mut report).await?;
        let embed_duration_ms = duration_millis(embed_started.elapsed());

        if report.embedded > 0 {
            // New embeddings change ranking inputs for every query.
            self.cache.invalidate_all().await;
        }

        if self.prune_missing {
            let pruned = ContentItem::prune_not_seen_since(&self.db, run_started_at).await?;
            if pruned > 0 {
                info!(pruned, "removed items the source no longer lists");
            }
        }

        info!(
            seen = report.seen,
            upserted = report.upserted,
            embedded = report.embedded,
            embedding_failures = report.embedding_failures,
            fetch_duration_ms,
            embed_duration_ms,
            total_duration_ms = duration_millis(started.elapsed()),
            "sync run finished"
        );

        Ok(report)
    }

    async fn pull_pages(
        &self,
        report: &mut SyncReport,
        run_started_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut page = 1u32;
        loop {
            let entries = self.source.fetch_page(page, self.page_size).await?;
            // The empty page is the only end-of-corpus signal; a short page
            // says nothing.
            if entries.is_empty() {
                return Ok(());
            }

            for entry in entries {
                report.seen = report.seen.saturating_add(1);
                let fields = normalize_entry(entry);
                let outcome =
                    ContentItem::upsert_from_source(&self.db, fields, run_started_at).await?;
                if outcome.changed {
                    report.upserted = report.upserted.saturating_add(1);
                }
            }

            page = page.saturating_add(1);
        }
    }

    async fn embed_missing(&self, report: &mut SyncReport) -> Result<(), AppError> {
        let pending = ContentItem::missing_embeddings(&self.db).await?;
        if pending.is_empty() {
            return Ok(());
        }
        info!(pending = pending.len(), "backfilling embeddings");

        for item in pending {
            let input = item.embedding_input();
            let retry_strategy = ExponentialBackoff::from_millis(100).map(jitter).take(3);

            match Retry::spawn(retry_strategy, || self.embedding_provider.embed(&input)).await {
                Ok(embedding) => {
                    let applied = ContentItem::set_embedding(
                        &self.db,
                        &item.external_id,
                        &item.content_hash,
                        embedding,
                    )
                    .await?;

                    if applied {
                        report.embedded = report.embedded.saturating_add(1);
                    } else {
                        // Content changed under us; the next run embeds the new text.
                        warn!(item_id = %item.external_id, "discarded embedding for changed content");
                    }
                }
                Err(err) => {
                    report.embedding_failures = report.embedding_failures.saturating_add(1);
                    warn!(
                        item_id = %item.external_id,
                        error = %err,
                        "embedding failed; item deferred to the next run"
                    );
                }
            }
        }

        Ok(())
    }
}

fn duration_millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
