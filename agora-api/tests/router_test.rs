/// Router tests that never reach the database
///
/// The router runs over a lazily connecting pool, so these cover everything
/// decided before a query: routing, session rejection, the error body shape
/// and response headers.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{lazy_app, send};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_protected_routes_require_session() {
    let cases = [
        ("GET", "/v1/users/me"),
        ("GET", "/v1/feed"),
        ("GET", "/v1/inquiries"),
        ("GET", "/v1/conversations"),
        ("GET", "/v1/conversations/unread"),
        ("POST", "/v1/media"),
        ("DELETE", "/v1/reviews/5b0c8a52-4f5e-4c43-9f0a-6c1e9d7b2a11"),
        (
            "PATCH",
            "/v1/pages/5b0c8a52-4f5e-4c43-9f0a-6c1e9d7b2a11/members/0f6a3c1e-8d2b-4e7a-9c5f-1b2d3e4f5a6b",
        ),
    ];

    for (method, uri) in cases {
        let (status, body) = send(lazy_app(), method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("unauthorized"));
    }
}

#[tokio::test]
async fn test_mutation_on_public_path_requires_session() {
    let (status, body) = send(
        lazy_app(),
        "POST",
        "/v1/pages",
        None,
        Some(json!({ "name": "Accra Lions", "kind": "club" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_forged_session_rejected() {
    let (status, _) = send(
        lazy_app(),
        "GET",
        "/v1/users/me",
        Some("Bearer not-a-real-token".to_string()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (status, _) = send(lazy_app(), "GET", "/v1/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_security_headers_on_error_responses() {
    let response = lazy_app()
        .oneshot(
            Request::builder()
                .uri("/v1/users/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    // Test config is not production
    assert!(headers.get("strict-transport-security").is_none());
}

#[tokio::test]
async fn test_health_reports_database_down() {
    let (status, body) = send(lazy_app(), "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("degraded"));
    assert_eq!(body["database"], json!("disconnected"));
    assert_eq!(body["redis"], json!("disabled"));
}
