//! Read models returned by the orchestrator.

use quill_db::models::article::Article;
use quill_db::models::attachment::Attachment;
use quill_identity::Identity;
use serde::Serialize;

/// A committed attachment with a freshly minted access URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentView {
    pub storage_key: String,
    pub original_name: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    /// Time-limited; regenerated on every read and never persisted.
    pub url: String,
}

impl AttachmentView {
    pub fn new(row: Attachment, url: String) -> Self {
        Self {
            storage_key: row.storage_key,
            original_name: row.original_name,
            content_type: row.content_type,
            size_bytes: row.size_bytes,
            url,
        }
    }
}

/// An article decorated with its author's identity and attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleView {
    #[serde(flatten)]
    pub article: Article,
    pub author: Identity,
    pub attachments: Vec<AttachmentView>,
}

/// One page of decorated articles.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleView>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
}
