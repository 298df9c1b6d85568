use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use quill_cloud::ObjectStore;
use quill_core::article::PageRequest;
use quill_core::error::CoreError;
use quill_core::storage_key::StorageKey;
use quill_core::types::DbId;
use quill_db::models::article::{Article, CreateArticle, RewriteArticle, UpdateArticle};
use quill_db::models::attachment::{Attachment, NewAttachment};
use quill_db::repositories::{ArticleRepo, AttachmentRepo, LikeRepo};
use quill_db::DbPool;
use quill_identity::IdentityResolver;

use super::views::{ArticleListResponse, ArticleView, AttachmentView};
use crate::background::{CleanupQueue, CleanupReason, CleanupTask};

/// An uploaded file to attach to a new article.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Client-supplied name. Only its extension is kept in the storage key.
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Coordinates the relational store, object store and identity resolver.
///
/// Errors from the collaborators are returned unchanged; this layer only
/// adds log context.
pub struct ArticleService {
    pool: DbPool,
    store: Arc<dyn ObjectStore>,
    identities: Arc<dyn IdentityResolver>,
    cleanup: CleanupQueue,
}

impl ArticleService {
    pub fn new(
        pool: DbPool,
        store: Arc<dyn ObjectStore>,
        identities: Arc<dyn IdentityResolver>,
        cleanup: CleanupQueue,
    ) -> Self {
        Self {
            pool,
            store,
            identities,
            cleanup,
        }
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Persist a new article, then store and index each file.
    ///
    /// A file failure fails the call but keeps the article row and the
    /// attachments committed before it. The failed file is handed to the
    /// cleanup queue.
    pub async fn create(
        &self,
        input: CreateArticle,
        files: Vec<NewFile>,
    ) -> Result<ArticleView, CoreError> {
        let article = ArticleRepo::create(&self.pool, &input)
            .await
            .map_err(|e| failed("create", None, e))?;
        tracing::info!(article_id = %article.id, author_id = %article.author_id, files = files.len(), "Article created");

        self.finish_write("create", article, files).await
    }

    /// Fork `input.original_article_id` into a new independent article.
    pub async fn rewrite(
        &self,
        input: RewriteArticle,
        files: Vec<NewFile>,
    ) -> Result<ArticleView, CoreError> {
        let original_id = input.original_article_id;
        let article = ArticleRepo::rewrite(&self.pool, &input)
            .await
            .map_err(|e| failed("rewrite", Some(original_id), e))?;
        tracing::info!(
            article_id = %article.id,
            original_article_id = %original_id,
            author_id = %article.author_id,
            files = files.len(),
            "Article rewritten"
        );

        self.finish_write("rewrite", article, files).await
    }

    /// Replace title and content. Returns the stored row.
    pub async fn update(&self, id: DbId, input: UpdateArticle) -> Result<Article, CoreError> {
        let article = ArticleRepo::update(&self.pool, id, &input)
            .await
            .map_err(|e| failed("update", Some(id), e))?;
        tracing::info!(article_id = %id, version = article.version, "Article updated");
        Ok(article)
    }

    /// Delete the article row, then hand its attachments to the cleanup queue.
    ///
    /// Only the row delete can fail the call; cleanup problems are logged and
    /// left to the background tasks.
    pub async fn delete(&self, id: DbId) -> Result<(), CoreError> {
        let article = ArticleRepo::get_by_id(&self.pool, id)
            .await
            .map_err(|e| failed("delete", Some(id), e))?;

        let attachments = match AttachmentRepo::list_by_article(&self.pool, article.id).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(article_id = %id, error = %e, "Could not list attachments before delete");
                Vec::new()
            }
        };

        ArticleRepo::delete(&self.pool, article.id)
            .await
            .map_err(|e| failed("delete", Some(id), e))?;
        tracing::info!(article_id = %id, attachments = attachments.len(), "Article deleted");

        self.schedule_cleanup(article.id, attachments).await;
        Ok(())
    }

    // ── Likes ────────────────────────────────────────────────────────

    /// `AlreadyExists` if the author already likes the article.
    pub async fn like(&self, author_id: &str, article_id: DbId) -> Result<(), CoreError> {
        LikeRepo::like(&self.pool, author_id, article_id)
            .await
            .map_err(|e| failed("like", Some(article_id), e))?;
        tracing::debug!(article_id = %article_id, author_id, "Article liked");
        Ok(())
    }

    /// `FailedPrecondition` if the author does not like the article.
    pub async fn unlike(&self, author_id: &str, article_id: DbId) -> Result<(), CoreError> {
        LikeRepo::unlike(&self.pool, author_id, article_id)
            .await
            .map_err(|e| failed("unlike", Some(article_id), e))?;
        tracing::debug!(article_id = %article_id, author_id, "Article unliked");
        Ok(())
    }

    pub async fn has_liked(&self, author_id: &str, article_id: DbId) -> Result<bool, CoreError> {
        LikeRepo::has_liked(&self.pool, author_id, article_id)
            .await
            .map_err(|e| failed("has_liked", Some(article_id), e))
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub async fn get(&self, id: DbId) -> Result<ArticleView, CoreError> {
        let article = ArticleRepo::get_by_id(&self.pool, id)
            .await
            .map_err(|e| failed("get", Some(id), e))?;

        self.decorate(vec![article])
            .await
            .map_err(|e| failed("get", Some(id), e))?
            .pop()
            .ok_or_else(|| CoreError::Internal(format!("article {id} lost during decoration")))
    }

    pub async fn list(&self, page: PageRequest) -> Result<ArticleListResponse, CoreError> {
        let page = ArticleRepo::list(&self.pool, page)
            .await
            .map_err(|e| failed("list", None, e))?;
        self.page_response(page.articles, page.total_count, page.page, page.page_size)
            .await
            .map_err(|e| failed("list", None, e))
    }

    pub async fn list_by_author(
        &self,
        author_id: &str,
        page: PageRequest,
    ) -> Result<ArticleListResponse, CoreError> {
        let page = ArticleRepo::list_by_author(&self.pool, author_id, page)
            .await
            .map_err(|e| failed("list_by_author", None, e))?;
        self.page_response(page.articles, page.total_count, page.page, page.page_size)
            .await
            .map_err(|e| failed("list_by_author", None, e))
    }

    // ---------------------------------------------------------------------------
    // Attachment saga
    // ---------------------------------------------------------------------------

    async fn finish_write(
        &self,
        operation: &'static str,
        article: Article,
        files: Vec<NewFile>,
    ) -> Result<ArticleView, CoreError> {
        let mut attachments = Vec::with_capacity(files.len());
        for file in files {
            let view = self
                .attach_file(article.id, file)
                .await
                .map_err(|e| failed(operation, Some(article.id), e))?;
            attachments.push(view);
        }

        let author = self
            .identities
            .resolve(&article.author_id)
            .await
            .map_err(|e| failed(operation, Some(article.id), e))?;

        Ok(ArticleView {
            article,
            author,
            attachments,
        })
    }

    /// pending intent -> blob write -> committed.
    async fn attach_file(&self, article_id: DbId, file: NewFile) -> Result<AttachmentView, CoreError> {
        let key = StorageKey::derive(&file.original_name);
        let intent = NewAttachment {
            storage_key: key.as_str().to_string(),
            article_id,
            original_name: file.original_name,
            content_type: file.content_type,
            size_bytes: file.bytes.len() as i64,
        };
        AttachmentRepo::record_pending(&self.pool, &intent).await?;

        let stored = match self
            .store
            .put(&key, file.bytes, intent.content_type.as_deref())
            .await
        {
            Ok(stored) => stored,
            Err(err) => {
                self.compensate(article_id, &key).await;
                return Err(err);
            }
        };

        let row = match AttachmentRepo::mark_committed(&self.pool, key.as_str()).await {
            Ok(row) => row,
            Err(err) => {
                self.compensate(article_id, &key).await;
                return Err(err);
            }
        };

        tracing::debug!(article_id = %article_id, storage_key = %key, size = row.size_bytes, "Attachment committed");
        Ok(AttachmentView::new(row, stored.url))
    }

    /// Undo a half-finished attachment: orphan its row and reclaim the blob.
    async fn compensate(&self, article_id: DbId, key: &StorageKey) {
        if let Err(e) = AttachmentRepo::mark_orphaned(&self.pool, &[key.as_str().to_string()]).await {
            tracing::warn!(storage_key = %key, error = %e, "Could not orphan failed attachment");
        }
        self.cleanup.enqueue(CleanupTask {
            storage_key: key.as_str().to_string(),
            article_id,
            reason: CleanupReason::UploadFailed,
        });
    }

    async fn schedule_cleanup(&self, article_id: DbId, attachments: Vec<Attachment>) {
        if attachments.is_empty() {
            return;
        }
        let keys: Vec<String> = attachments.into_iter().map(|a| a.storage_key).collect();
        if let Err(e) = AttachmentRepo::mark_orphaned(&self.pool, &keys).await {
            tracing::warn!(article_id = %article_id, error = %e, "Could not orphan attachments of deleted article");
        }
        for storage_key in keys {
            self.cleanup.enqueue(CleanupTask {
                storage_key,
                article_id,
                reason: CleanupReason::ArticleDeleted,
            });
        }
    }

    // ---------------------------------------------------------------------------
    // Read decoration
    // ---------------------------------------------------------------------------

    async fn page_response(
        &self,
        articles: Vec<Article>,
        total_count: i64,
        page: i64,
        page_size: i64,
    ) -> Result<ArticleListResponse, CoreError> {
        Ok(ArticleListResponse {
            articles: self.decorate(articles).await?,
            total_count,
            page,
            page_size,
        })
    }

    /// Attach committed attachments with fresh URLs and author identity.
    ///
    /// Any single failure fails the whole batch.
    async fn decorate(&self, articles: Vec<Article>) -> Result<Vec<ArticleView>, CoreError> {
        if articles.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<DbId> = articles.iter().map(|a| a.id).collect();
        let mut by_article: HashMap<DbId, Vec<Attachment>> = HashMap::new();
        for row in AttachmentRepo::list_committed_for_articles(&self.pool, &ids).await? {
            by_article.entry(row.article_id).or_default().push(row);
        }

        try_join_all(articles.into_iter().map(|article| {
            let rows = by_article.remove(&article.id).unwrap_or_default();
            self.decorate_one(article, rows)
        }))
        .await
    }

    async fn decorate_one(
        &self,
        article: Article,
        rows: Vec<Attachment>,
    ) -> Result<ArticleView, CoreError> {
        let attachments = try_join_all(rows.into_iter().map(|row| self.attachment_view(row)));
        let author = self.identities.resolve(&article.author_id);
        let (attachments, author) = futures::try_join!(attachments, author)?;

        Ok(ArticleView {
            article,
            author,
            attachments,
        })
    }

    async fn attachment_view(&self, row: Attachment) -> Result<AttachmentView, CoreError> {
        let url = self
            .store
            .url_for(&StorageKey::from_stored(row.storage_key.clone()))
            .await?;
        Ok(AttachmentView::new(row, url))
    }
}

/// Log a failed operation with context and hand the error back unchanged.
fn failed(operation: &'static str, article_id: Option<DbId>, err: CoreError) -> CoreError {
    let article_id = article_id.map(|id| id.to_string()).unwrap_or_default();
    match &err {
        CoreError::Internal(_) | CoreError::Unavailable(_) => {
            tracing::error!(operation, article_id = %article_id, kind = err.kind(), error = %err, "Article operation failed");
        }
        _ => {
            tracing::debug!(operation, article_id = %article_id, kind = err.kind(), error = %err, "Article operation rejected");
        }
    }
    err
}
