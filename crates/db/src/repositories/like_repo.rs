//! Repository for the `article_likes` table.
//!
//! The `(author_id, article_id)` primary key is the only guard against
//! duplicate likes: callers do not check first, they insert and let the
//! constraint decide. The cached `articles.like_count` is adjusted in the same
//! transaction as the edge.

use quill_core::article::{require_fields, require_id};
use quill_core::error::CoreError;
use quill_core::types::DbId;
use sqlx::PgPool;

use crate::error::{db_error, sqlstate, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};
use crate::models::like::ArticleLike;

/// Provides like, unlike and like-status queries.
pub struct LikeRepo;

impl LikeRepo {
    /// Record that `author_id` likes `article_id`.
    ///
    /// Fails with [`CoreError::AlreadyExists`] if the pair is already present
    /// and [`CoreError::NotFound`] if the article does not exist.
    pub async fn like(
        pool: &PgPool,
        author_id: &str,
        article_id: DbId,
    ) -> Result<ArticleLike, CoreError> {
        validate(author_id, article_id)?;

        let mut tx = pool.begin().await.map_err(db_error)?;

        let like = sqlx::query_as::<_, ArticleLike>(
            "INSERT INTO article_likes (author_id, article_id) VALUES ($1, $2) \
             RETURNING author_id, article_id, created_at",
        )
        .bind(author_id)
        .bind(article_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match sqlstate(&err).as_deref() {
            Some(UNIQUE_VIOLATION) => CoreError::AlreadyExists(format!(
                "author {author_id} has already liked article {article_id}"
            )),
            Some(FOREIGN_KEY_VIOLATION) => CoreError::not_found("Article", article_id),
            _ => db_error(err),
        })?;

        sqlx::query("UPDATE articles SET like_count = like_count + 1 WHERE id = $1")
            .bind(article_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(like)
    }

    /// Remove the like edge between `author_id` and `article_id`.
    ///
    /// Fails with [`CoreError::FailedPrecondition`] if the author had not
    /// liked the article (including when the article does not exist).
    pub async fn unlike(pool: &PgPool, author_id: &str, article_id: DbId) -> Result<(), CoreError> {
        validate(author_id, article_id)?;

        let mut tx = pool.begin().await.map_err(db_error)?;

        let result =
            sqlx::query("DELETE FROM article_likes WHERE author_id = $1 AND article_id = $2")
                .bind(author_id)
                .bind(article_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(CoreError::FailedPrecondition(format!(
                "author {author_id} has not liked article {article_id}"
            )));
        }

        sqlx::query(
            "UPDATE articles SET like_count = GREATEST(like_count - 1, 0) WHERE id = $1",
        )
        .bind(article_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    /// Whether `author_id` currently likes `article_id`.
    pub async fn has_liked(
        pool: &PgPool,
        author_id: &str,
        article_id: DbId,
    ) -> Result<bool, CoreError> {
        validate(author_id, article_id)?;

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM article_likes WHERE author_id = $1 AND article_id = $2",
        )
        .bind(author_id)
        .bind(article_id)
        .fetch_one(pool)
        .await
        .map_err(db_error)?;
        Ok(count > 0)
    }

    /// Number of like edges for an article, independent of the cached counter.
    pub async fn count_for_article(pool: &PgPool, article_id: DbId) -> Result<i64, CoreError> {
        require_id("article_id", article_id)?;

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM article_likes WHERE article_id = $1")
                .bind(article_id)
                .fetch_one(pool)
                .await
                .map_err(db_error)?;
        Ok(count)
    }
}

fn validate(author_id: &str, article_id: DbId) -> Result<(), CoreError> {
    require_fields(&[("author_id", author_id)])?;
    require_id("article_id", article_id)
}
