//! HTTP client for the user service.
//!
//! Issues `GET {base_url}/users/{author_id}` and expects a JSON body with
//! `full_name`, `username` and `profile_pic_url`.

use async_trait::async_trait;
use quill_core::error::CoreError;
use reqwest::{StatusCode, Url};

use crate::config::IdentityConfig;
use crate::{Identity, IdentityResolver};

/// [`IdentityResolver`] backed by the user service REST API.
#[derive(Debug, Clone)]
pub struct HttpIdentityResolver {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpIdentityResolver {
    /// Build a resolver with its own connection pool.
    pub fn new(config: &IdentityConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CoreError::Internal(format!("Failed to build identity client: {e}")))?;
        Self::with_client(client, &config.base_url)
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, CoreError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            CoreError::InvalidArgument(format!("Invalid identity service URL '{base_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CoreError::InvalidArgument(format!(
                "Identity service URL '{base_url}' cannot be a base URL"
            )));
        }
        Ok(Self { client, base_url })
    }

    fn user_url(&self, author_id: &str) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("users").push(author_id);
        }
        url
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve(&self, author_id: &str) -> Result<Identity, CoreError> {
        if author_id.trim().is_empty() {
            return Err(CoreError::InvalidArgument("author_id is required".into()));
        }

        let response = self
            .client
            .get(self.user_url(author_id))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(author_id, error = %e, "Identity lookup request failed");
                CoreError::Unavailable(format!("identity service request failed: {e}"))
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CoreError::not_found("Identity", author_id));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(author_id, status = status.as_u16(), body = %body, "Identity service error");
            return Err(CoreError::Unavailable(format!(
                "identity service returned {status}"
            )));
        }

        response.json::<Identity>().await.map_err(|e| {
            tracing::warn!(author_id, error = %e, "Malformed identity response");
            CoreError::Unavailable(format!("identity service sent a malformed body: {e}"))
        })
    }
}
