use std::sync::Arc;

use crate::config::ServerConfig;
use crate::service::ArticleService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; every field is a pool or behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: quill_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Article lifecycle orchestrator.
    pub articles: Arc<ArticleService>,
}
