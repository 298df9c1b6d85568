//! Resolver over a fixed map, for local runs and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use quill_core::error::CoreError;

use crate::{Identity, IdentityResolver};

/// Resolves from an in-memory table. Unknown ids are `NotFound`.
#[derive(Debug, Default)]
pub struct StaticIdentityResolver {
    identities: Mutex<HashMap<String, Identity>>,
    unavailable: Mutex<bool>,
    calls: Mutex<u32>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `author_id` with an identity derived from the id itself.
    pub fn with_author(self, author_id: &str) -> Self {
        self.insert(
            author_id,
            Identity {
                full_name: format!("Author {author_id}"),
                username: author_id.to_string(),
                profile_pic_url: format!("https://avatars.invalid/{author_id}.png"),
            },
        );
        self
    }

    pub fn insert(&self, author_id: &str, identity: Identity) {
        self.identities
            .lock()
            .unwrap()
            .insert(author_id.to_string(), identity);
    }

    pub fn remove(&self, author_id: &str) {
        self.identities.lock().unwrap().remove(author_id);
    }

    /// Simulate the identity service being down.
    pub fn set_unavailable(&self, down: bool) {
        *self.unavailable.lock().unwrap() = down;
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, author_id: &str) -> Result<Identity, CoreError> {
        *self.calls.lock().unwrap() += 1;
        if *self.unavailable.lock().unwrap() {
            return Err(CoreError::Unavailable("identity service unavailable".into()));
        }
        self.identities
            .lock()
            .unwrap()
            .get(author_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Identity", author_id))
    }
}
