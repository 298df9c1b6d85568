//! Background tasks that reclaim attachment blobs.
//!
//! Each task is a long-running async function intended to be spawned via
//! `tokio::spawn`. All tasks accept a [`CancellationToken`] for graceful
//! shutdown.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod backoff;
pub mod cleanup;
pub mod reconciler;

pub use cleanup::{CleanupQueue, CleanupReason, CleanupTask, CleanupWorker};
pub use reconciler::Reconciler;
