//! Attachment cleanup queue and worker.
//!
//! Producers (article deletion, failed uploads, the reconciler) hand storage
//! keys of `orphaned` index rows to a bounded [`CleanupQueue`]. The
//! [`CleanupWorker`] deletes each blob with capped exponential backoff and
//! then removes the index row. Enqueueing never blocks: when the queue is
//! full the row simply stays `orphaned` until the next reconciler sweep.

use std::sync::Arc;

use quill_cloud::ObjectStore;
use quill_core::error::CoreError;
use quill_core::storage_key::StorageKey;
use quill_core::types::DbId;
use quill_db::models::attachment::AttachmentState;
use quill_db::repositories::AttachmentRepo;
use quill_db::DbPool;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use super::backoff::Backoff;
use crate::config::CleanupConfig;

/// Why a blob is being reclaimed. Used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupReason {
    ArticleDeleted,
    UploadFailed,
    Reconciled,
}

impl CleanupReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ArticleDeleted => "article_deleted",
            Self::UploadFailed => "upload_failed",
            Self::Reconciled => "reconciled",
        }
    }
}

/// One blob to reclaim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupTask {
    pub storage_key: String,
    pub article_id: DbId,
    pub reason: CleanupReason,
}

/// Result of processing a single [`CleanupTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Blob and index row are gone.
    Reclaimed,
    /// The row is `committed` again and must not be touched.
    Skipped,
    /// Something failed; the row stays `orphaned` for the reconciler.
    Deferred,
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// Sending half of the cleanup channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CleanupQueue {
    tx: mpsc::Sender<CleanupTask>,
}

impl CleanupQueue {
    /// Create a queue holding at most `capacity` pending tasks.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<CleanupTask>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Hand a task to the worker without waiting.
    ///
    /// Returns `false` when the task was dropped; its row is still
    /// `orphaned` and will be found by the reconciler.
    pub fn enqueue(&self, task: CleanupTask) -> bool {
        match self.tx.try_send(task) {
            Ok(()) => true,
            Err(TrySendError::Full(task)) => {
                tracing::warn!(
                    storage_key = %task.storage_key,
                    article_id = %task.article_id,
                    reason = task.reason.as_str(),
                    "Cleanup queue full, leaving attachment for the reconciler"
                );
                false
            }
            Err(TrySendError::Closed(task)) => {
                tracing::warn!(
                    storage_key = %task.storage_key,
                    article_id = %task.article_id,
                    reason = task.reason.as_str(),
                    "Cleanup queue closed, leaving attachment for the reconciler"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Consumes [`CleanupTask`]s and reclaims their blobs.
pub struct CleanupWorker {
    pool: DbPool,
    store: Arc<dyn ObjectStore>,
    backoff: Backoff,
}

impl CleanupWorker {
    pub fn new(pool: DbPool, store: Arc<dyn ObjectStore>, config: &CleanupConfig) -> Self {
        Self {
            pool,
            store,
            backoff: Backoff::new(config.max_attempts, config.initial_backoff, config.max_backoff),
        }
    }

    /// Run until `cancel` fires or every [`CleanupQueue`] handle is dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<CleanupTask>, cancel: CancellationToken) {
        tracing::info!(
            max_attempts = self.backoff.max_attempts,
            "Attachment cleanup worker started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Attachment cleanup worker stopping");
                    break;
                }
                task = rx.recv() => match task {
                    Some(task) => {
                        self.process(&task).await;
                    }
                    None => {
                        tracing::info!("Cleanup queue closed, worker exiting");
                        break;
                    }
                }
            }
        }
    }

    /// Reclaim one blob and its index row.
    pub async fn process(&self, task: &CleanupTask) -> CleanupOutcome {
        match AttachmentRepo::find_by_key(&self.pool, &task.storage_key).await {
            Ok(Some(row)) if row.state() == Some(AttachmentState::Committed) => {
                tracing::debug!(
                    storage_key = %task.storage_key,
                    "Attachment is committed, skipping cleanup"
                );
                return CleanupOutcome::Skipped;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(storage_key = %task.storage_key, error = %e, "Cleanup lookup failed");
                return CleanupOutcome::Deferred;
            }
        }

        let key = StorageKey::from_stored(task.storage_key.clone());
        match self.delete_blob(&key).await {
            Ok(attempts) => match AttachmentRepo::delete_by_key(&self.pool, key.as_str()).await {
                Ok(_) => {
                    tracing::info!(
                        storage_key = %key,
                        article_id = %task.article_id,
                        reason = task.reason.as_str(),
                        attempts,
                        "Attachment reclaimed"
                    );
                    CleanupOutcome::Reclaimed
                }
                Err(e) => {
                    tracing::warn!(storage_key = %key, error = %e, "Blob deleted but index row remains");
                    CleanupOutcome::Deferred
                }
            },
            Err(err) => {
                tracing::error!(
                    storage_key = %key,
                    article_id = %task.article_id,
                    attempts = self.backoff.max_attempts,
                    error = %err,
                    "Attachment cleanup exhausted retries"
                );
                if let Err(e) =
                    AttachmentRepo::record_failure(&self.pool, key.as_str(), &err.to_string()).await
                {
                    tracing::warn!(storage_key = %key, error = %e, "Failed to record cleanup failure");
                }
                CleanupOutcome::Deferred
            }
        }
    }

    /// Delete the blob, retrying with backoff. Returns the attempts used.
    async fn delete_blob(&self, key: &StorageKey) -> Result<u32, CoreError> {
        let mut attempt = 1;
        loop {
            match self.store.delete(key).await {
                Ok(()) => return Ok(attempt),
                Err(err) if attempt >= self.backoff.max_attempts => return Err(err),
                Err(err) => {
                    let delay = self.backoff.delay(attempt);
                    tracing::debug!(
                        storage_key = %key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Blob delete failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(key: &str) -> CleanupTask {
        CleanupTask {
            storage_key: key.to_string(),
            article_id: DbId::now_v7(),
            reason: CleanupReason::ArticleDeleted,
        }
    }

    #[tokio::test]
    async fn enqueue_never_blocks_when_full() {
        let (queue, mut rx) = CleanupQueue::bounded(1);
        assert!(queue.enqueue(task("a.png")));
        assert!(!queue.enqueue(task("b.png")));

        assert_eq!(rx.recv().await.unwrap().storage_key, "a.png");
    }

    #[tokio::test]
    async fn enqueue_after_receiver_dropped_reports_failure() {
        let (queue, rx) = CleanupQueue::bounded(4);
        drop(rx);
        assert!(!queue.enqueue(task("a.png")));
    }
}
