//! HTTP-level integration tests for the article endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, delete, get, post_json, post_multipart, put_json, ALICE, BOB};
use serde_json::json;
use sqlx::PgPool;

/// Create an article over HTTP and return its id.
async fn create_article(app: axum::Router, author: &str, title: &str) -> String {
    let response = post_multipart(
        app,
        "/api/v1/articles",
        &[("author_id", author), ("title", title), ("content", "body")],
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Health and middleware
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_reports_database_up(pool: PgPool) {
    let (app, _h) = build_test_app(pool);
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "up");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_route_returns_404(pool: PgPool) {
    let (app, _h) = build_test_app(pool);
    let response = get(app, "/api/v1/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Create / get
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_with_file_then_get(pool: PgPool) {
    let (app, h) = build_test_app(pool);

    let response = post_multipart(
        app.clone(),
        "/api/v1/articles",
        &[("author_id", ALICE), ("title", "Hello"), ("content", "World")],
        &[("photo.JPG", b"jpeg-bytes")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["title"], "Hello");
    assert_eq!(created["author_id"], ALICE);
    assert_eq!(created["like_count"], 0);
    assert_eq!(created["author"]["username"], ALICE);
    assert_eq!(created["attachments"][0]["original_name"], "photo.JPG");
    let key = created["attachments"][0]["storage_key"].as_str().unwrap();
    assert!(key.ends_with(".jpg"));
    assert_eq!(h.store.get(key).unwrap(), b"jpeg-bytes");

    let id = created["id"].as_str().unwrap();
    let response = get(app, &format!("/api/v1/articles/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["id"], created["id"]);
    assert_eq!(fetched["attachments"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_without_title_is_400(pool: PgPool) {
    let (app, _h) = build_test_app(pool);
    let response = post_multipart(
        app,
        "/api/v1/articles",
        &[("author_id", ALICE), ("content", "body")],
        &[],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_ARGUMENT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_upload_is_503_and_article_remains(pool: PgPool) {
    let (app, h) = build_test_app(pool);
    h.store.fail_puts(true);

    let response = post_multipart(
        app.clone(),
        "/api/v1/articles",
        &[("author_id", ALICE), ("title", "t"), ("content", "c")],
        &[("a.png", b"x")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "UNAVAILABLE");

    let listing = body_json(get(app, &format!("/api/v1/authors/{ALICE}/articles")).await).await;
    assert_eq!(listing["total_count"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_with_bad_or_unknown_id(pool: PgPool) {
    let (app, _h) = build_test_app(pool);

    let response = get(app.clone(), "/api/v1/articles/not-a-uuid").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_ARGUMENT");

    let response = get(app, "/api/v1/articles/0190a1b2-c3d4-7e5f-8a6b-7c8d9e0f1a2b").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Update / rewrite / delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_bumps_version(pool: PgPool) {
    let (app, _h) = build_test_app(pool);
    let id = create_article(app.clone(), ALICE, "v1").await;

    let response = put_json(
        app,
        &format!("/api/v1/articles/{id}"),
        json!({ "title": "v2", "content": "new body" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["title"], "v2");
    assert_eq!(json["content"], "new body");
    assert_eq!(json["version"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rewrite_records_origin(pool: PgPool) {
    let (app, _h) = build_test_app(pool);
    let original = create_article(app.clone(), ALICE, "Original").await;

    let response = post_multipart(
        app.clone(),
        &format!("/api/v1/articles/{original}/rewrites"),
        &[("author_id", BOB), ("title", "Fork"), ("content", "forked")],
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let fork = body_json(response).await;
    assert_eq!(fork["original_article_id"], original.as_str());
    assert_eq!(fork["author"]["username"], BOB);

    let response = post_multipart(
        app,
        "/api/v1/articles/0190a1b2-c3d4-7e5f-8a6b-7c8d9e0f1a2b/rewrites",
        &[("author_id", BOB), ("title", "Fork"), ("content", "forked")],
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_then_delete_again(pool: PgPool) {
    let (app, _h) = build_test_app(pool);
    let id = create_article(app.clone(), ALICE, "Doomed").await;

    let response = delete(app.clone(), &format!("/api/v1/articles/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "success": true }));

    let response = delete(app, &format!("/api/v1/articles/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn like_unlike_round_trip(pool: PgPool) {
    let (app, _h) = build_test_app(pool);
    let id = create_article(app.clone(), ALICE, "Likeable").await;
    let likes = format!("/api/v1/articles/{id}/likes");
    let bobs_like = format!("{likes}/{BOB}");

    let response = post_json(app.clone(), &likes, json!({ "author_id": BOB })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    let response = post_json(app.clone(), &likes, json!({ "author_id": BOB })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "ALREADY_EXISTS");

    let liked = body_json(get(app.clone(), &bobs_like).await).await;
    assert_eq!(liked["liked"], true);

    let response = delete(app.clone(), &bobs_like).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete(app.clone(), &bobs_like).await;
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    assert_eq!(body_json(response).await["code"], "FAILED_PRECONDITION");

    let liked = body_json(get(app, &bobs_like).await).await;
    assert_eq!(liked["liked"], false);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_defaults_and_validation(pool: PgPool) {
    let (app, _h) = build_test_app(pool);
    for title in ["a", "b", "c"] {
        create_article(app.clone(), ALICE, title).await;
    }

    let json = body_json(get(app.clone(), "/api/v1/articles").await).await;
    assert_eq!(json["page"], 1);
    assert_eq!(json["page_size"], 10);
    assert_eq!(json["total_count"], 3);
    assert_eq!(json["articles"][0]["title"], "c");

    let json = body_json(get(app.clone(), "/api/v1/articles?page=2&page_size=2").await).await;
    assert_eq!(json["articles"].as_array().unwrap().len(), 1);
    assert_eq!(json["articles"][0]["title"], "a");

    let response = get(app, "/api/v1/articles?page=0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_ARGUMENT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_by_author_filters(pool: PgPool) {
    let (app, _h) = build_test_app(pool);
    create_article(app.clone(), ALICE, "mine").await;
    create_article(app.clone(), BOB, "theirs").await;

    let json = body_json(get(app, &format!("/api/v1/authors/{BOB}/articles?page_size=5")).await).await;
    assert_eq!(json["total_count"], 1);
    assert_eq!(json["page_size"], 5);
    assert_eq!(json["articles"][0]["title"], "theirs");
}
