//! Repository for the `articles` table.

use chrono::Utc;
use quill_core::article::{new_article_id, require_fields, require_id, PageRequest};
use quill_core::error::CoreError;
use quill_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::db_error;
use crate::models::article::{Article, ArticlePage, CreateArticle, RewriteArticle, UpdateArticle};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, author_id, original_article_id, title, content, \
    like_count, version, created_at, updated_at";

/// Newest first; the UUIDv7 id breaks ties between equal timestamps.
const ORDER_BY: &str = "ORDER BY created_at DESC, id DESC";

/// Provides creation, forking, editing, deletion and paginated reads of articles.
pub struct ArticleRepo;

impl ArticleRepo {
    // ── Writes ───────────────────────────────────────────────────────

    /// Insert a new original article with a freshly minted time-ordered id.
    pub async fn create(pool: &PgPool, input: &CreateArticle) -> Result<Article, CoreError> {
        require_fields(&[
            ("author_id", input.author_id.as_str()),
            ("title", input.title.as_str()),
            ("content", input.content.as_str()),
        ])?;

        let query = format!(
            "INSERT INTO articles (id, author_id, title, content, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Article>(&query)
            .bind(new_article_id())
            .bind(&input.author_id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
            .map_err(db_error)
    }

    /// Replace the title and content of an article and bump its version.
    ///
    /// Returns the row as stored after the update, so store-populated
    /// fields such as `updated_at` are reflected.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateArticle,
    ) -> Result<Article, CoreError> {
        require_id("article_id", id)?;
        require_fields(&[("title", input.title.as_str()), ("content", input.content.as_str())])?;

        let query = format!(
            "UPDATE articles SET
                title = $2,
                content = $3,
                version = version + 1,
                updated_at = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(Utc::now())
            .fetch_optional(pool)
            .await
            .map_err(db_error)?
            .ok_or_else(|| CoreError::not_found("Article", id))
    }

    /// Insert an independent fork of an existing article.
    ///
    /// The original is locked with `FOR KEY SHARE` for the duration of the
    /// insert so it cannot be deleted between the existence check and the
    /// write. The fork starts with its own id, no likes and no attachments.
    pub async fn rewrite(pool: &PgPool, input: &RewriteArticle) -> Result<Article, CoreError> {
        require_fields(&[
            ("author_id", input.author_id.as_str()),
            ("title", input.title.as_str()),
            ("content", input.content.as_str()),
        ])?;
        require_id("original_article_id", input.original_article_id)?;

        let mut tx = pool.begin().await.map_err(db_error)?;

        let original: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM articles WHERE id = $1 FOR KEY SHARE")
                .bind(input.original_article_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;
        if original.is_none() {
            return Err(CoreError::not_found("Article", input.original_article_id));
        }

        let query = format!(
            "INSERT INTO articles
                (id, author_id, original_article_id, title, content, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {COLUMNS}"
        );
        let fork = sqlx::query_as::<_, Article>(&query)
            .bind(new_article_id())
            .bind(&input.author_id)
            .bind(input.original_article_id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(fork)
    }

    /// Permanently delete an article row.
    ///
    /// Likes go with it through `ON DELETE CASCADE`; attachments are left for
    /// the caller to reclaim.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), CoreError> {
        require_id("article_id", id)?;

        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Article", id));
        }
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Find an article by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Article>, CoreError> {
        require_id("article_id", id)?;

        let query = format!("SELECT {COLUMNS} FROM articles WHERE id = $1");
        sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(db_error)
    }

    /// Like [`ArticleRepo::find_by_id`] but a missing row is an error.
    pub async fn get_by_id(pool: &PgPool, id: DbId) -> Result<Article, CoreError> {
        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Article", id))
    }

    /// One page of all articles, newest first.
    pub async fn list(pool: &PgPool, page: PageRequest) -> Result<ArticlePage, CoreError> {
        let mut tx = begin_repeatable_read(pool).await?;

        let (total_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;

        let query = format!("SELECT {COLUMNS} FROM articles {ORDER_BY} LIMIT $1 OFFSET $2");
        let articles = sqlx::query_as::<_, Article>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(ArticlePage {
            articles,
            total_count,
            page: page.page(),
            page_size: page.page_size(),
        })
    }

    /// One page of a single author's articles, newest first.
    pub async fn list_by_author(
        pool: &PgPool,
        author_id: &str,
        page: PageRequest,
    ) -> Result<ArticlePage, CoreError> {
        require_fields(&[("author_id", author_id)])?;

        let mut tx = begin_repeatable_read(pool).await?;

        let (total_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM articles WHERE author_id = $1")
                .bind(author_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?;

        let query = format!(
            "SELECT {COLUMNS} FROM articles WHERE author_id = $1 {ORDER_BY} LIMIT $2 OFFSET $3"
        );
        let articles = sqlx::query_as::<_, Article>(&query)
            .bind(author_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(ArticlePage {
            articles,
            total_count,
            page: page.page(),
            page_size: page.page_size(),
        })
    }
}

/// Open a transaction whose count and slice queries see one snapshot.
///
/// `SET TRANSACTION` must be the first statement after `BEGIN`.
async fn begin_repeatable_read(pool: &PgPool) -> Result<Transaction<'static, Postgres>, CoreError> {
    let mut tx = pool.begin().await.map_err(db_error)?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
    Ok(tx)
}
