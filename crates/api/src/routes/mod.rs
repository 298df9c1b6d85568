pub mod article;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /articles                                  list, create
/// /articles/{id}                             get, update, delete
/// /articles/{id}/rewrites                    fork (POST)
/// /articles/{id}/likes                       like (POST)
/// /articles/{id}/likes/{author_id}           has-liked (GET), unlike (DELETE)
///
/// /authors/{author_id}/articles              list by author
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(article::router())
}
