//! Bearer-token authentication integration tests.
//!
//! Tests verify:
//! - Valid tokens pass the guard
//! - Missing/malformed headers and invalid/expired tokens are rejected
//! - The two 401 failure messages are distinct
//! - Every protected route is guarded

use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use stashbox::TokenService;

use super::test_utils::{
    register_user, request, test_router, MockCredentialStore, MockObjectStore, TEST_JWT_SECRET,
};

const NO_HEADER_MESSAGE: &str = "Unauthorized: No or invalid authorization header.";
const BAD_TOKEN_MESSAGE: &str = "Unauthorized: Invalid or expired token";

// =============================================================================
// Valid Tokens
// =============================================================================

#[tokio::test]
async fn test_valid_token_passes_guard() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());
    let token = register_user(&router, "alice", "hunter22").await;

    let (status, body) = request(&router, "GET", "/api/files", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"], serde_json::json!([]));
}

// =============================================================================
// Missing / Malformed Headers
// =============================================================================

#[tokio::test]
async fn test_missing_authorization_header() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());

    let (status, body) = request(&router, "GET", "/api/files", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], NO_HEADER_MESSAGE);
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());
    let token = register_user(&router, "alice", "hunter22").await;

    // Wrong scheme, lowercase scheme, and bare token all fail the same way
    for header_value in [
        format!("Token {}", token),
        format!("bearer {}", token),
        token.clone(),
    ] {
        let req = Request::builder()
            .method("GET")
            .uri("/api/files")
            .header("authorization", header_value)
            .body(Body::empty())
            .unwrap();

        let response = router.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], NO_HEADER_MESSAGE);
    }
}

// =============================================================================
// Invalid / Expired Tokens
// =============================================================================

#[tokio::test]
async fn test_forged_token_rejected() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());

    // Signed with a different secret
    let forged = TokenService::new("some-other-secret-32-bytes-long!!!")
        .issue("alice")
        .unwrap();

    let (status, body) = request(&router, "GET", "/api/files", Some(&forged), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], BAD_TOKEN_MESSAGE);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    // Issued two hours ago, expired one hour ago
    let expired = TokenService::new(TEST_JWT_SECRET)
        .issue_at("alice", now - 7200, now - 3600)
        .unwrap();

    let (status, body) = request(&router, "GET", "/api/files", Some(&expired), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], BAD_TOKEN_MESSAGE);
}

#[tokio::test]
async fn test_failure_messages_are_distinct() {
    assert_ne!(NO_HEADER_MESSAGE, BAD_TOKEN_MESSAGE);
}

// =============================================================================
// Guard Coverage
// =============================================================================

#[tokio::test]
async fn test_all_file_routes_are_guarded() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());

    let protected = [
        ("GET", "/api/files"),
        ("PUT", "/api/files/report.pdf"),
        ("GET", "/api/files/report.pdf"),
        ("DELETE", "/api/files/report.pdf"),
    ];

    for (method, path) in protected {
        let (status, body) = request(&router, method, path, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, path);
        assert_eq!(body["message"], NO_HEADER_MESSAGE);
    }
}

#[tokio::test]
async fn test_public_routes_need_no_token() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());

    let (status, body) = request(&router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
