pub mod normalize;
pub mod pipeline;
pub mod source;

pub use pipeline::{SyncPipeline, SyncReport};
pub use source::{ContentSource, HttpContentSource};

use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

/// Drives scheduled synchronization: one run at startup, then one per
/// interval. A tick that lands while a run is still in flight is skipped
/// rather than queued.
pub async fn run_sync_scheduler(pipeline: Arc<SyncPipeline>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match pipeline.try_sync().await {
            Some(Ok(report)) => {
                info!(
                    seen = report.seen,
                    upserted = report.upserted,
                    embedded = report.embedded,
                    embedding_failures = report.embedding_failures,
                    "scheduled sync finished"
                );
            }
            Some(Err(err)) => {
                error!(error = %err, "scheduled sync failed; retrying at the next interval");
            }
            None => {}
        }
    }
}
