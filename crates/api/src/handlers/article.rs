//! Handlers for the `/articles` resource and author listings.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use quill_core::article::parse_article_id;
use quill_db::models::article::{Article, CreateArticle, RewriteArticle, UpdateArticle};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::{LikedResponse, SuccessResponse};
use crate::service::{ArticleListResponse, ArticleView, NewFile};
use crate::state::AppState;

/// Request body for `POST /articles/{id}/likes`.
#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub author_id: String,
}

/// Text fields and files of an article multipart form.
#[derive(Debug, Default)]
struct ArticleForm {
    author_id: String,
    title: String,
    content: String,
    files: Vec<NewFile>,
}

/// Read `author_id`, `title`, `content` and any number of `file` parts.
/// Unknown fields are ignored.
async fn read_article_form(mut multipart: Multipart) -> AppResult<ArticleForm> {
    let mut form = ArticleForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" | "files" => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.files.push(NewFile {
                    original_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "author_id" | "title" | "content" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                match name.as_str() {
                    "author_id" => form.author_id = text,
                    "title" => form.title = text,
                    _ => form.content = text,
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/v1/articles
///
/// Multipart form with `author_id`, `title`, `content` and optional `file`
/// parts.
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ArticleView>)> {
    let form = read_article_form(multipart).await?;
    let input = CreateArticle {
        author_id: form.author_id,
        title: form.title,
        content: form.content,
    };
    let view = state.articles.create(input, form.files).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/articles?page=&page_size=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ArticleListResponse>> {
    let page = params.to_page_request()?;
    Ok(Json(state.articles.list(page).await?))
}

/// GET /api/v1/articles/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ArticleView>> {
    let id = parse_article_id(&id)?;
    Ok(Json(state.articles.get(id).await?))
}

/// PUT /api/v1/articles/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateArticle>,
) -> AppResult<Json<Article>> {
    let id = parse_article_id(&id)?;
    Ok(Json(state.articles.update(id, input).await?))
}

/// DELETE /api/v1/articles/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    let id = parse_article_id(&id)?;
    state.articles.delete(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/v1/articles/{id}/rewrites
///
/// Same form as [`create`]; the new article records `{id}` as its origin.
pub async fn rewrite(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ArticleView>)> {
    let original_article_id = parse_article_id(&id)?;
    let form = read_article_form(multipart).await?;
    let input = RewriteArticle {
        author_id: form.author_id,
        original_article_id,
        title: form.title,
        content: form.content,
    };
    let view = state.articles.rewrite(input, form.files).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// POST /api/v1/articles/{id}/likes
pub async fn like(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LikeRequest>,
) -> AppResult<Json<SuccessResponse>> {
    let id = parse_article_id(&id)?;
    state.articles.like(&body.author_id, id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/v1/articles/{id}/likes/{author_id}
pub async fn unlike(
    State(state): State<AppState>,
    Path((id, author_id)): Path<(String, String)>,
) -> AppResult<Json<SuccessResponse>> {
    let id = parse_article_id(&id)?;
    state.articles.unlike(&author_id, id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/v1/articles/{id}/likes/{author_id}
pub async fn has_liked(
    State(state): State<AppState>,
    Path((id, author_id)): Path<(String, String)>,
) -> AppResult<Json<LikedResponse>> {
    let id = parse_article_id(&id)?;
    let liked = state.articles.has_liked(&author_id, id).await?;
    Ok(Json(LikedResponse { liked }))
}

/// GET /api/v1/authors/{author_id}/articles?page=&page_size=
pub async fn list_by_author(
    State(state): State<AppState>,
    Path(author_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ArticleListResponse>> {
    let page = params.to_page_request()?;
    Ok(Json(state.articles.list_by_author(&author_id, page).await?))
}
