//! Author identity lookup.
//!
//! Articles store only an opaque author id; display identity is resolved at
//! read time from an external user service. Lookups are uncached and have no
//! side effects.

use async_trait::async_trait;
use quill_core::error::CoreError;
use serde::{Deserialize, Serialize};

pub mod config;
pub mod fixed;
pub mod http;

pub use config::IdentityConfig;
pub use fixed::StaticIdentityResolver;
pub use http::HttpIdentityResolver;

/// Display identity of an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub full_name: String,
    pub username: String,
    pub profile_pic_url: String,
}

/// Resolves author ids to display identities.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `NotFound` when the identity does not exist, `Unavailable` when the
    /// identity service cannot be reached.
    async fn resolve(&self, author_id: &str) -> Result<Identity, CoreError>;
}
