//! Periodic sweep of the attachment index.
//!
//! Catches everything the cleanup queue missed: tasks dropped on a full
//! queue, rows whose `mark_orphaned` failed, `pending` intents abandoned by a
//! crashed upload, and `committed` rows whose article no longer exists.
//! Matching rows are marked `orphaned` and handed back to the worker.

use std::time::Duration;

use chrono::Utc;
use quill_core::error::CoreError;
use quill_db::repositories::AttachmentRepo;
use quill_db::DbPool;
use tokio_util::sync::CancellationToken;

use super::cleanup::{CleanupQueue, CleanupReason, CleanupTask};
use crate::config::CleanupConfig;

/// Re-enqueues reclaimable attachments on a fixed interval.
pub struct Reconciler {
    pool: DbPool,
    queue: CleanupQueue,
    interval: Duration,
    grace: Duration,
    batch: i64,
}

impl Reconciler {
    pub fn new(pool: DbPool, queue: CleanupQueue, config: &CleanupConfig) -> Self {
        Self {
            pool,
            queue,
            interval: config.reconcile_interval,
            grace: config.pending_grace,
            batch: config.batch_size,
        }
    }

    /// Run until `cancel` fires. The first sweep happens immediately.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            grace_secs = self.grace.as_secs(),
            batch = self.batch,
            "Attachment reconciler started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Attachment reconciler stopping");
                    break;
                }
                _ = interval.tick() => match self.sweep().await {
                    Ok(0) => tracing::debug!("Reconciler: nothing to reclaim"),
                    Ok(enqueued) => tracing::info!(enqueued, "Reconciler: re-enqueued attachments"),
                    Err(e) => tracing::error!(error = %e, "Reconciler: sweep failed"),
                }
            }
        }
    }

    /// One pass over the index. Returns how many tasks were enqueued.
    ///
    /// Rows that do not fit in the queue stay `orphaned` for the next pass.
    pub async fn sweep(&self) -> Result<usize, CoreError> {
        let grace = chrono::Duration::from_std(self.grace)
            .map_err(|e| CoreError::Internal(format!("Invalid reconcile grace period: {e}")))?;
        let stale_before = Utc::now() - grace;

        let rows = AttachmentRepo::list_reclaimable(&self.pool, stale_before, self.batch).await?;
        if rows.is_empty() {
            return Ok(0);
        }

        let keys: Vec<String> = rows.iter().map(|r| r.storage_key.clone()).collect();
        AttachmentRepo::mark_orphaned(&self.pool, &keys).await?;

        let mut enqueued = 0;
        for row in rows {
            let task = CleanupTask {
                storage_key: row.storage_key,
                article_id: row.article_id,
                reason: CleanupReason::Reconciled,
            };
            if !self.queue.enqueue(task) {
                break;
            }
            enqueued += 1;
        }
        Ok(enqueued)
    }
}
