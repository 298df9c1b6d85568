//! Object store adapter for article attachments.
//!
//! [`ObjectStore`] is the seam the orchestrator talks to. Two backends ship
//! with the crate:
//!
//! - [`s3::S3ObjectStore`] for S3 and S3-compatible services (MinIO).
//! - [`memory::InMemoryObjectStore`] for local development and tests.
//!
//! No operation retries on its own; callers layer retry policy on top.

use std::sync::Arc;

use async_trait::async_trait;
use quill_core::error::CoreError;
use quill_core::storage_key::StorageKey;

pub mod config;
pub mod memory;
pub mod s3;

pub use config::{S3Config, StorageBackend, StorageConfig};
pub use memory::InMemoryObjectStore;
pub use s3::S3ObjectStore;

/// Result of a successful [`ObjectStore::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub storage_key: StorageKey,
    /// Time-limited retrieval URL, valid for the store's configured ttl.
    pub url: String,
}

/// Blob storage with time-limited access URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key`, then mint an access URL for it.
    ///
    /// Keys come from [`StorageKey::derive`], never from user input.
    async fn put(
        &self,
        key: &StorageKey,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<StoredObject, CoreError>;

    /// Remove the blob under `key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &StorageKey) -> Result<(), CoreError>;

    /// Mint a fresh time-limited URL. The ttl is store configuration.
    async fn url_for(&self, key: &StorageKey) -> Result<String, CoreError>;
}

/// Build the backend selected by `config`.
///
/// For S3 the bucket is created if it does not exist yet.
pub async fn build_object_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, CoreError> {
    match config.backend {
        StorageBackend::S3 => {
            let store = S3ObjectStore::connect(&config.s3, config.url_expiry).await;
            store.ensure_bucket().await?;
            tracing::info!(bucket = %config.s3.bucket, "S3 object store ready");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object store; blobs are lost on restart");
            Ok(Arc::new(InMemoryObjectStore::new(config.url_expiry)))
        }
    }
}
