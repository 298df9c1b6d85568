use std::time::Duration;

use assert_matches::assert_matches;
use quill_core::error::CoreError;
use quill_identity::{HttpIdentityResolver, IdentityConfig, IdentityResolver};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver_for(server: &MockServer) -> HttpIdentityResolver {
    HttpIdentityResolver::new(&IdentityConfig {
        base_url: server.uri(),
        timeout: Duration::from_millis(500),
    })
    .unwrap()
}

#[tokio::test]
async fn resolves_identity_from_user_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/author-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "full_name": "Ada Lovelace",
            "username": "ada",
            "profile_pic_url": "https://cdn.example.com/ada.png",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = resolver_for(&server).resolve("author-1").await.unwrap();
    assert_eq!(identity.full_name, "Ada Lovelace");
    assert_eq!(identity.username, "ada");
    assert_eq!(identity.profile_pic_url, "https://cdn.example.com/ada.png");
}

#[tokio::test]
async fn missing_identity_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = resolver_for(&server).resolve("ghost").await;
    assert_matches!(result, Err(CoreError::NotFound { entity: "Identity", .. }));
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let result = resolver_for(&server).resolve("author-1").await;
    assert_matches!(result, Err(CoreError::Unavailable(_)));
}

#[tokio::test]
async fn malformed_body_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = resolver_for(&server).resolve("author-1").await;
    assert_matches!(result, Err(CoreError::Unavailable(_)));
}

#[tokio::test]
async fn slow_service_times_out_as_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let result = resolver_for(&server).resolve("author-1").await;
    assert_matches!(result, Err(CoreError::Unavailable(_)));
}

#[tokio::test]
async fn unreachable_service_is_unavailable() {
    let resolver = HttpIdentityResolver::new(&IdentityConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout: Duration::from_millis(500),
    })
    .unwrap();

    assert_matches!(resolver.resolve("author-1").await, Err(CoreError::Unavailable(_)));
}
