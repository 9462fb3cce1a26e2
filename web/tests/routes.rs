//! Route-level tests driving the full router with `oneshot`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::time::Duration;
use storefront_auth::mocks::{MockDataBackend, MockIdentityBackend};
use storefront_auth::{DataError, Identity, SessionConfig, SessionCoordinator};
use storefront_web::{AppState, CORRELATION_ID_HEADER, build_router};
use tower::ServiceExt;

const WAIT: Duration = Duration::from_secs(2);

struct Harness {
    app: Router,
    session: SessionCoordinator<MockIdentityBackend>,
    data: MockDataBackend,
}

async fn harness(backend: MockIdentityBackend) -> Harness {
    storefront_testing::init_test_tracing();
    let session = SessionCoordinator::new(backend, SessionConfig::default());
    session.start().await.unwrap();
    session.wait_until_ready(WAIT).await.unwrap();

    let data = MockDataBackend::new();
    let app = build_router(AppState::new(session.clone(), data.clone()));
    Harness { app, session, data }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn alice() -> Identity {
    Identity::new("user-alice", "user@example.com")
}

// ═══════════════════════════════════════════════════════════════════════
// Products
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn get_info_echoes_product_id() {
    let h = harness(MockIdentityBackend::new()).await;

    let (status, body) = get(&h.app, "/api/products/getInfo?product_id=42").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "product_id": "42" }));
}

#[tokio::test]
async fn get_info_without_parameter_is_empty_object() {
    let h = harness(MockIdentityBackend::new()).await;

    let (status, body) = get(&h.app, "/api/products/getInfo").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

/// Repeated parameters collapse to the first value, never an array.
#[tokio::test]
async fn get_info_first_value_wins() {
    let h = harness(MockIdentityBackend::new()).await;

    let (status, body) = get(&h.app, "/api/products/getInfo?product_id=a&product_id=b").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "product_id": "a" }));
    assert!(body["product_id"].is_string());
}

#[tokio::test]
async fn product_lookup_returns_record() {
    let h = harness(MockIdentityBackend::new()).await;
    h.data
        .insert(
            "products",
            "7",
            json!({ "id": 7, "name": "Lamp", "created_at": "2024-05-01T10:00:00Z" }),
        )
        .unwrap();

    let (status, body) = get(&h.app, "/api/products/7").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product_id"], "7");
    assert_eq!(body["product"]["name"], "Lamp");
}

#[tokio::test]
async fn missing_or_failed_product_is_null() {
    let h = harness(MockIdentityBackend::new()).await;

    let (status, body) = get(&h.app, "/api/products/404").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "product_id": "404", "product": null }));

    h.data
        .fail_with(DataError::Transport("connection refused".to_string()))
        .unwrap();
    let (status, body) = get(&h.app, "/api/products/7").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["product"].is_null());
}

// ═══════════════════════════════════════════════════════════════════════
// Auth
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn sign_in_then_session_reflects_user() {
    let h = harness(MockIdentityBackend::new().with_user("secret", alice())).await;

    let (status, body) = post_json(
        &h.app,
        "/api/auth/sign-in",
        json!({ "email": "user@example.com", "password": "secret" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Signed in successfully");
    assert_eq!(body["user"]["email"], "user@example.com");

    h.session
        .wait_for(|v| v.identity == Some(alice()), WAIT)
        .await
        .unwrap();
    let (status, body) = get(&h.app, "/api/auth/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(body["identity"]["id"], "user-alice");
}

#[tokio::test]
async fn rejected_sign_in_returns_backend_message() {
    let h = harness(MockIdentityBackend::new().with_user("secret", alice())).await;

    let (status, body) = post_json(
        &h.app,
        "/api/auth/sign-in",
        json!({ "email": "user@example.com", "password": "wrong" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "code": "AUTH_ERROR", "message": "Invalid login credentials" })
    );
}

#[tokio::test]
async fn empty_fields_are_rejected() {
    let h = harness(MockIdentityBackend::new()).await;

    let (status, body) = post_json(
        &h.app,
        "/api/auth/sign-up",
        json!({ "email": "", "password": "pw" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(body["message"], "Please fill in all fields");
}

#[tokio::test]
async fn sign_up_asks_for_confirmation() {
    let h = harness(MockIdentityBackend::new()).await;

    let (status, body) = post_json(
        &h.app,
        "/api/auth/sign-up",
        json!({ "email": "new@example.com", "password": "pw" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confirmation_required"], true);
    assert_eq!(
        body["message"],
        "Registration successful! Check your email to confirm."
    );
    assert_eq!(body["user"]["email"], "new@example.com");
}

/// Sign-in and sign-out act on the one process-wide session, so an
/// unrelated later request observes them.
#[tokio::test]
async fn session_routes_share_the_single_operator_session() {
    let h = harness(MockIdentityBackend::new().with_user("secret", alice())).await;

    let (status, _) = post_json(
        &h.app,
        "/api/auth/sign-in",
        json!({ "email": "user@example.com", "password": "secret" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    h.session
        .wait_for(|v| v.identity == Some(alice()), WAIT)
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/api/auth/session")
        .header(CORRELATION_ID_HEADER, "another-caller")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"]["id"], "user-alice");

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/sign-out")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Signed out");
    h.session
        .wait_for(|v| v.identity.is_none(), WAIT)
        .await
        .unwrap();

    let (status, body) = get(&h.app, "/api/auth/session").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["identity"].is_null());
}

#[tokio::test]
async fn sign_out_failure_keeps_session() {
    let backend = MockIdentityBackend::new().with_session(alice());
    backend.fail_sign_out_with("network error");
    let h = harness(backend).await;
    h.session
        .wait_for(|v| v.identity.is_some(), WAIT)
        .await
        .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/sign-out")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "network error");
    assert_eq!(h.session.current_view().await.identity, Some(alice()));
}

// ═══════════════════════════════════════════════════════════════════════
// Health and headers
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn readiness_reports_ready_after_start() {
    let h = harness(MockIdentityBackend::new()).await;

    let (status, body) = get(&h.app, "/health/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(body["store"]["status"], "Healthy");
}

#[tokio::test]
async fn readiness_fails_after_shutdown() {
    let h = harness(MockIdentityBackend::new()).await;
    h.session.shutdown(WAIT).await.unwrap();

    let (status, body) = get(&h.app, "/health/ready").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["store"]["status"], "Unhealthy");
}

#[tokio::test]
async fn every_response_carries_correlation_id() {
    let h = harness(MockIdentityBackend::new()).await;

    for uri in ["/health", "/api/products/getInfo", "/api/auth/session"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert!(
            response.headers().contains_key(CORRELATION_ID_HEADER),
            "missing header on {uri}"
        );
    }
}
