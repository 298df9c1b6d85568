//! Repository for the `article_attachments` table.
//!
//! Besides indexing which blobs belong to which article, each row records
//! where its blob is in the write/cleanup lifecycle so that interrupted
//! uploads and deletions can be reconciled later.

use quill_core::article::require_id;
use quill_core::error::CoreError;
use quill_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::error::db_error;
use crate::models::attachment::{Attachment, AttachmentState, NewAttachment};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "storage_key, article_id, original_name, content_type, size_bytes, \
    state, attempts, last_error, created_at, updated_at";

/// Provides the attachment index and its saga bookkeeping.
pub struct AttachmentRepo;

impl AttachmentRepo {
    // ── Saga steps ───────────────────────────────────────────────────

    /// Record the intent to store a blob under `input.storage_key`.
    ///
    /// The row starts `pending` and is invisible to readers until
    /// [`AttachmentRepo::mark_committed`] succeeds.
    pub async fn record_pending(
        pool: &PgPool,
        input: &NewAttachment,
    ) -> Result<Attachment, CoreError> {
        require_id("article_id", input.article_id)?;
        if input.storage_key.trim().is_empty() {
            return Err(CoreError::InvalidArgument("storage_key is required".into()));
        }

        let query = format!(
            "INSERT INTO article_attachments
                (storage_key, article_id, original_name, content_type, size_bytes, state)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(&input.storage_key)
            .bind(input.article_id)
            .bind(&input.original_name)
            .bind(&input.content_type)
            .bind(input.size_bytes)
            .bind(AttachmentState::Pending.as_str())
            .fetch_one(pool)
            .await
            .map_err(db_error)
    }

    /// Flip a `pending` row to `committed` once its blob is stored.
    pub async fn mark_committed(pool: &PgPool, storage_key: &str) -> Result<Attachment, CoreError> {
        let query = format!(
            "UPDATE article_attachments SET state = $2, updated_at = NOW()
             WHERE storage_key = $1 AND state = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(storage_key)
            .bind(AttachmentState::Committed.as_str())
            .bind(AttachmentState::Pending.as_str())
            .fetch_optional(pool)
            .await
            .map_err(db_error)?
            .ok_or_else(|| CoreError::not_found("Attachment", storage_key))
    }

    /// Mark rows for reclamation. Returns the number of rows updated.
    pub async fn mark_orphaned(pool: &PgPool, storage_keys: &[String]) -> Result<u64, CoreError> {
        if storage_keys.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE article_attachments SET state = $2, updated_at = NOW() \
             WHERE storage_key = ANY($1)",
        )
        .bind(storage_keys)
        .bind(AttachmentState::Orphaned.as_str())
        .execute(pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    /// Note a failed cleanup attempt on an orphaned row.
    pub async fn record_failure(
        pool: &PgPool,
        storage_key: &str,
        error: &str,
    ) -> Result<(), CoreError> {
        sqlx::query(
            "UPDATE article_attachments \
             SET attempts = attempts + 1, last_error = $2, updated_at = NOW() \
             WHERE storage_key = $1",
        )
        .bind(storage_key)
        .bind(error)
        .execute(pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    /// Remove an index row. Returns `true` if a row was deleted.
    pub async fn delete_by_key(pool: &PgPool, storage_key: &str) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM article_attachments WHERE storage_key = $1")
            .bind(storage_key)
            .execute(pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Find a single row by key, in any state.
    pub async fn find_by_key(
        pool: &PgPool,
        storage_key: &str,
    ) -> Result<Option<Attachment>, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM article_attachments WHERE storage_key = $1");
        sqlx::query_as::<_, Attachment>(&query)
            .bind(storage_key)
            .fetch_optional(pool)
            .await
            .map_err(db_error)
    }

    /// Every row owned by an article, in any state, oldest first.
    pub async fn list_by_article(
        pool: &PgPool,
        article_id: DbId,
    ) -> Result<Vec<Attachment>, CoreError> {
        require_id("article_id", article_id)?;

        let query = format!(
            "SELECT {COLUMNS} FROM article_attachments
             WHERE article_id = $1
             ORDER BY created_at, storage_key"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(article_id)
            .fetch_all(pool)
            .await
            .map_err(db_error)
    }

    /// Committed attachments for a batch of articles, oldest first per article.
    pub async fn list_committed_for_articles(
        pool: &PgPool,
        article_ids: &[DbId],
    ) -> Result<Vec<Attachment>, CoreError> {
        if article_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM article_attachments
             WHERE article_id = ANY($1) AND state = $2
             ORDER BY article_id, created_at, storage_key"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(article_ids)
            .bind(AttachmentState::Committed.as_str())
            .fetch_all(pool)
            .await
            .map_err(db_error)
    }

    /// Rows whose blob should be reclaimed.
    ///
    /// - `orphaned` or `pending` rows not touched since `stale_before`
    /// - `committed` rows whose article no longer exists
    pub async fn list_reclaimable(
        pool: &PgPool,
        stale_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<Attachment>, CoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM article_attachments a
             WHERE (a.state <> $2 AND a.updated_at < $1)
                OR (a.state = $2 AND NOT EXISTS (SELECT 1 FROM articles WHERE id = a.article_id))
             ORDER BY a.updated_at
             LIMIT $3"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(stale_before)
            .bind(AttachmentState::Committed.as_str())
            .bind(limit)
            .fetch_all(pool)
            .await
            .map_err(db_error)
    }
}
