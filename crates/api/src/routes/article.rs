use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::article;
use crate::state::AppState;

/// Upper bound on a multipart article body.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/articles", get(article::list).post(article::create))
        .route(
            "/articles/{id}",
            get(article::get_by_id)
                .put(article::update)
                .delete(article::delete),
        )
        .route("/articles/{id}/rewrites", post(article::rewrite))
        .route("/articles/{id}/likes", post(article::like))
        .route(
            "/articles/{id}/likes/{author_id}",
            get(article::has_liked).delete(article::unlike),
        )
        .route("/authors/{author_id}/articles", get(article::list_by_author))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
