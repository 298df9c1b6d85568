//! S3 (and S3-compatible) implementation of [`ObjectStore`].

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use quill_core::error::CoreError;
use quill_core::storage_key::StorageKey;

use crate::config::S3Config;
use crate::{ObjectStore, StoredObject};

const STATIC_CREDENTIALS_PROVIDER: &str = "quill-static";

/// Object store backed by a single S3 bucket.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
    url_expiry: Duration,
}

impl S3ObjectStore {
    /// Build a client from `config`. Does not touch the network.
    pub async fn connect(config: &S3Config, url_expiry: Duration) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let (Some(access), Some(secret)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(aws_credential_types::Credentials::new(
                access.clone(),
                secret.clone(),
                None,
                None,
                STATIC_CREDENTIALS_PROVIDER,
            ));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            url_expiry,
        }
    }

    /// Create the bucket when it does not exist.
    pub async fn ensure_bucket(&self) -> Result<(), CoreError> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => return Ok(()),
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false);
                if !missing {
                    return Err(unavailable("head_bucket", err));
                }
            }
        }

        let mut request = self.client.create_bucket().bucket(&self.bucket);
        // us-east-1 rejects an explicit location constraint.
        if self.region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|e| unavailable("create_bucket", e))?;

        tracing::info!(bucket = %self.bucket, "Created object store bucket");
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &StorageKey,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<StoredObject, CoreError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(ByteStream::from(bytes))
            .set_content_type(content_type.map(str::to_owned))
            .send()
            .await
            .map_err(|e| unavailable("put_object", e))?;

        tracing::debug!(storage_key = %key, size, "Stored object");

        let url = self.url_for(key).await?;
        Ok(StoredObject {
            storage_key: key.clone(),
            url,
        })
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), CoreError> {
        // S3 answers 204 for keys that do not exist.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|e| unavailable("delete_object", e))?;
        Ok(())
    }

    async fn url_for(&self, key: &StorageKey) -> Result<String, CoreError> {
        let presigning = PresigningConfig::expires_in(self.url_expiry)
            .map_err(|e| CoreError::Internal(format!("Invalid URL expiry: {e}")))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .presigned(presigning)
            .await
            .map_err(|e| unavailable("presign get_object", e))?;

        Ok(presigned.uri().to_string())
    }
}

fn unavailable<E: std::error::Error>(operation: &str, err: E) -> CoreError {
    let detail = DisplayErrorContext(err).to_string();
    tracing::warn!(operation, error = %detail, "Object store call failed");
    CoreError::Unavailable(format!("object store {operation} failed: {detail}"))
}
