//! In-process [`ObjectStore`] for local development and tests.
//!
//! Supports failure injection so callers can exercise their compensation
//! paths without a real backend.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use quill_core::error::CoreError;
use quill_core::storage_key::StorageKey;

use crate::{ObjectStore, StoredObject};

#[derive(Debug, Clone)]
struct Blob {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

#[derive(Debug, Default)]
struct Faults {
    puts: bool,
    urls: bool,
    /// Number of upcoming deletes that fail; `u32::MAX` fails forever.
    deletes: u32,
}

/// Thread-safe map of key to blob.
#[derive(Debug)]
pub struct InMemoryObjectStore {
    blobs: Mutex<HashMap<String, Blob>>,
    faults: Mutex<Faults>,
    delete_calls: Mutex<u32>,
    url_expiry: Duration,
}

impl InMemoryObjectStore {
    pub fn new(url_expiry: Duration) -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            faults: Mutex::new(Faults::default()),
            delete_calls: Mutex::new(0),
            url_expiry,
        }
    }

    // ── Failure injection ──

    /// Make every subsequent `put` fail with `Unavailable`.
    pub fn fail_puts(&self, fail: bool) {
        self.faults.lock().unwrap().puts = fail;
    }

    /// Make every subsequent `url_for` fail with `Unavailable`.
    pub fn fail_urls(&self, fail: bool) {
        self.faults.lock().unwrap().urls = fail;
    }

    /// Fail the next `times` deletes, then succeed again.
    pub fn fail_deletes(&self, times: u32) {
        self.faults.lock().unwrap().deletes = times;
    }

    // ── Inspection ──

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(key).map(|b| b.bytes.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .and_then(|b| b.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total delete attempts, failed ones included.
    pub fn delete_calls(&self) -> u32 {
        *self.delete_calls.lock().unwrap()
    }

    fn mint_url(&self, key: &StorageKey) -> String {
        let expires = SystemTime::now()
            .checked_add(self.url_expiry)
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(u64::MAX);
        format!("memory://objects/{key}?expires={expires}")
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::config::DEFAULT_URL_EXPIRY_SECS))
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(
        &self,
        key: &StorageKey,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<StoredObject, CoreError> {
        if self.faults.lock().unwrap().puts {
            return Err(CoreError::Unavailable("object store put failed (injected)".into()));
        }
        self.blobs.lock().unwrap().insert(
            key.as_str().to_string(),
            Blob {
                bytes,
                content_type: content_type.map(str::to_owned),
            },
        );
        let url = self.url_for(key).await?;
        Ok(StoredObject {
            storage_key: key.clone(),
            url,
        })
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), CoreError> {
        *self.delete_calls.lock().unwrap() += 1;
        {
            let mut faults = self.faults.lock().unwrap();
            if faults.deletes > 0 {
                if faults.deletes != u32::MAX {
                    faults.deletes -= 1;
                }
                return Err(CoreError::Unavailable("object store delete failed (injected)".into()));
            }
        }
        self.blobs.lock().unwrap().remove(key.as_str());
        Ok(())
    }

    async fn url_for(&self, key: &StorageKey) -> Result<String, CoreError> {
        if self.faults.lock().unwrap().urls {
            return Err(CoreError::Unavailable("object store url failed (injected)".into()));
        }
        Ok(self.mint_url(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn key() -> StorageKey {
        StorageKey::derive("report.PDF")
    }

    #[tokio::test]
    async fn put_stores_bytes_and_mints_url() {
        let store = InMemoryObjectStore::default();
        let key = key();
        let stored = store
            .put(&key, b"hello".to_vec(), Some("application/pdf"))
            .await
            .unwrap();

        assert_eq!(stored.storage_key, key);
        assert!(stored.url.contains(key.as_str()));
        assert_eq!(store.get(key.as_str()).unwrap(), b"hello");
        assert_eq!(store.content_type(key.as_str()).as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryObjectStore::default();
        let key = key();
        store.put(&key, vec![1, 2, 3], None).await.unwrap();

        store.delete(&key).await.unwrap();
        store.delete(&key).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(store.delete_calls(), 2);
    }

    #[tokio::test]
    async fn injected_put_failure_stores_nothing() {
        let store = InMemoryObjectStore::default();
        store.fail_puts(true);
        let result = store.put(&key(), vec![0], None).await;
        assert_matches!(result, Err(CoreError::Unavailable(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_failures_are_counted_down() {
        let store = InMemoryObjectStore::default();
        let key = key();
        store.put(&key, vec![0], None).await.unwrap();
        store.fail_deletes(2);

        assert!(store.delete(&key).await.is_err());
        assert!(store.delete(&key).await.is_err());
        assert!(store.contains(key.as_str()));
        store.delete(&key).await.unwrap();
        assert!(!store.contains(key.as_str()));
    }

    #[tokio::test]
    async fn url_failure_surfaces() {
        let store = InMemoryObjectStore::default();
        store.fail_urls(true);
        assert_matches!(store.url_for(&key()).await, Err(CoreError::Unavailable(_)));
    }
}
