//! Article entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use quill_core::types::{AuthorId, DbId, Timestamp};

/// A row from the `articles` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Article {
    pub id: DbId,
    pub author_id: AuthorId,
    /// Set only on forks produced by a rewrite.
    pub original_article_id: Option<DbId>,
    pub title: String,
    pub content: String,
    /// Cached count of `article_likes` rows, maintained by `LikeRepo`.
    pub like_count: i32,
    /// Starts at 1 and increments on every update.
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Article {
    pub fn is_fork(&self) -> bool {
        self.original_article_id.is_some()
    }
}

/// DTO for creating an original article.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArticle {
    pub author_id: AuthorId,
    pub title: String,
    pub content: String,
}

/// DTO for forking an existing article.
#[derive(Debug, Clone, Deserialize)]
pub struct RewriteArticle {
    pub author_id: AuthorId,
    pub original_article_id: DbId,
    pub title: String,
    pub content: String,
}

/// DTO for editing an article. Authorship and id are immutable.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateArticle {
    pub title: String,
    pub content: String,
}

/// One page of articles plus the total visible in the same snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
}
