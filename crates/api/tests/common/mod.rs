#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use quill_api::background::{CleanupQueue, CleanupTask};
use quill_api::config::{CleanupConfig, ServerConfig};
use quill_api::router::build_app_router;
use quill_api::service::{ArticleService, NewFile};
use quill_api::state::AppState;
use quill_cloud::InMemoryObjectStore;
use quill_identity::StaticIdentityResolver;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

/// Everything a test needs to drive and inspect the orchestrator.
pub struct Harness {
    pub pool: PgPool,
    pub service: Arc<ArticleService>,
    pub store: Arc<InMemoryObjectStore>,
    pub identities: Arc<StaticIdentityResolver>,
    pub queue: CleanupQueue,
    pub cleanup_rx: mpsc::Receiver<CleanupTask>,
}

impl Harness {
    pub fn new(pool: PgPool) -> Self {
        Self::with_queue_capacity(pool, 64)
    }

    /// Like [`Harness::new`] but with a cleanup queue of `capacity` slots.
    pub fn with_queue_capacity(pool: PgPool, capacity: usize) -> Self {
        let store = Arc::new(InMemoryObjectStore::new(Duration::from_secs(60)));
        let identities = Arc::new(StaticIdentityResolver::new().with_author(ALICE).with_author(BOB));
        let (queue, cleanup_rx) = CleanupQueue::bounded(capacity);
        let service = Arc::new(ArticleService::new(
            pool.clone(),
            store.clone(),
            identities.clone(),
            queue.clone(),
        ));
        Self {
            pool,
            service,
            store,
            identities,
            queue,
            cleanup_rx,
        }
    }

    /// Drain every task currently sitting in the cleanup queue.
    pub fn drain_cleanup(&mut self) -> Vec<CleanupTask> {
        let mut tasks = Vec::new();
        while let Ok(task) = self.cleanup_rx.try_recv() {
            tasks.push(task);
        }
        tasks
    }
}

/// Cleanup tuning with millisecond backoff so retry tests stay fast.
pub fn fast_cleanup_config() -> CleanupConfig {
    CleanupConfig {
        queue_capacity: 64,
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        reconcile_interval: Duration::from_millis(50),
        pending_grace: Duration::from_secs(900),
        batch_size: 100,
    }
}

pub fn png(name: &str) -> NewFile {
    NewFile {
        original_name: name.to_string(),
        content_type: Some("image/png".to_string()),
        bytes: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        database_url: String::new(),
        db_max_connections: 5,
    }
}

/// Build the full application router over a fresh [`Harness`].
pub fn build_test_app(pool: PgPool) -> (Router, Harness) {
    let harness = Harness::new(pool.clone());
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        articles: harness.service.clone(),
    };
    (build_app_router(state, &config), harness)
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::PUT, uri, body).await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

const BOUNDARY: &str = "quill-test-boundary";

/// POST a `multipart/form-data` body with text fields and `file` parts.
pub async fn post_multipart(
    app: Router,
    uri: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &[u8])],
) -> Response<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    send(
        app,
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
