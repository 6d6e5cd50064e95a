//! Login integration tests.
//!
//! Tests verify:
//! - Successful login returns a verifiable token
//! - Unknown usernames and wrong passwords are indistinguishable
//! - Missing fields and database failures

use axum::http::StatusCode;
use serde_json::json;

use super::test_utils::{
    register_user, request, request_raw_body, test_router, token_username, MockCredentialStore,
    MockObjectStore,
};

#[tokio::test]
async fn test_login_success() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());
    register_user(&router, "alice", "hunter22").await;

    let (status, body) = request(
        &router,
        "POST",
        "/api/login",
        None,
        Some(json!({ "username": "alice", "password": "hunter22" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(token_username(body["token"].as_str().unwrap()), "alice");
}

#[tokio::test]
async fn test_login_unknown_username() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());

    let (status, body) = request(
        &router,
        "POST",
        "/api/login",
        None,
        Some(json!({ "username": "nouser", "password": "x" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_login_wrong_password_same_message_as_unknown_user() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());
    register_user(&router, "alice", "hunter22").await;

    let (status, wrong_password) = request(
        &router,
        "POST",
        "/api/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, unknown_user) = request(
        &router,
        "POST",
        "/api/login",
        None,
        Some(json!({ "username": "nouser", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Identical messages so usernames cannot be enumerated
    assert_eq!(wrong_password["message"], unknown_user["message"]);
    assert_eq!(wrong_password["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_login_missing_fields() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());

    let incomplete_bodies = [
        json!({}),
        json!({ "username": "alice" }),
        json!({ "password": "hunter22" }),
        json!({ "username": "", "password": "hunter22" }),
    ];

    for body in incomplete_bodies {
        let (status, response) = request(&router, "POST", "/api/login", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["message"], "Username and password are required");
    }
}

#[tokio::test]
async fn test_login_absent_or_malformed_body() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());

    // No body and no content-type
    let (status, body) = request(&router, "POST", "/api/login", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username and password are required");

    // Empty and non-JSON bodies get the same field-validation response
    for (content_type, raw) in [
        (Some("application/json"), ""),
        (Some("application/json"), "not json"),
        (Some("text/plain"), "username=alice"),
    ] {
        let (status, body) =
            request_raw_body(&router, "POST", "/api/login", content_type, raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {:?}", raw);
        assert_eq!(body["message"], "Username and password are required");
    }
}

#[tokio::test]
async fn test_login_database_failure() {
    let users = MockCredentialStore::new();
    let router = test_router(MockObjectStore::new(), users.clone());

    users.set_failing(true);

    let (status, body) = request(
        &router,
        "POST",
        "/api/login",
        None,
        Some(json!({ "username": "alice", "password": "hunter22" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error logging in user");
    // The raw underlying error is surfaced to the caller
    assert!(body["error"].as_str().unwrap().contains("database failure"));
}
