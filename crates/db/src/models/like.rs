//! Like edge model.

use serde::Serialize;
use sqlx::FromRow;
use quill_core::types::{AuthorId, DbId, Timestamp};

/// A row from the `article_likes` table, keyed by `(author_id, article_id)`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ArticleLike {
    pub author_id: AuthorId,
    pub article_id: DbId,
    pub created_at: Timestamp,
}
