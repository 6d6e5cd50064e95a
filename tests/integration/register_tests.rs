//! Registration integration tests.
//!
//! Tests verify:
//! - Successful registration provisions a bucket and returns a valid token
//! - Early-access gating
//! - Username policy enforcement before any store/storage call
//! - Duplicate and unavailable usernames
//! - The non-atomic credential-insert/bucket-create sequence

use axum::http::StatusCode;
use serde_json::json;

use super::test_utils::{
    request, request_raw_body, test_router, token_username, MockCredentialStore, MockObjectStore,
    TEST_ACCESS_CODE,
};

fn register_body(username: &str) -> serde_json::Value {
    json!({
        "username": username,
        "password": "hunter22",
        "earlyAccessSecret": TEST_ACCESS_CODE,
    })
}

// =============================================================================
// Success
// =============================================================================

#[tokio::test]
async fn test_register_success() {
    let storage = MockObjectStore::new();
    let users = MockCredentialStore::new();
    let router = test_router(storage.clone(), users.clone());

    let (status, body) = request(
        &router,
        "POST",
        "/api/register",
        None,
        Some(register_body("alice")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);

    // The token is bound to the submitted username
    let token = body["token"].as_str().unwrap();
    assert_eq!(token_username(token), "alice");

    // Credential row and bucket both exist
    assert!(users.contains("alice"));
    assert!(storage.bucket_exists("alice"));
}

#[tokio::test]
async fn test_register_then_login_round_trip() {
    let storage = MockObjectStore::new();
    let users = MockCredentialStore::new();
    let router = test_router(storage, users);

    let (status, _) = request(
        &router,
        "POST",
        "/api/register",
        None,
        Some(register_body("alice")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

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

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_register_missing_fields() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());

    let incomplete_bodies = [
        json!({}),
        json!({ "username": "alice" }),
        json!({ "username": "alice", "password": "hunter22" }),
        json!({ "password": "hunter22", "earlyAccessSecret": TEST_ACCESS_CODE }),
        json!({ "username": "", "password": "hunter22", "earlyAccessSecret": TEST_ACCESS_CODE }),
    ];

    for body in incomplete_bodies {
        let (status, response) = request(&router, "POST", "/api/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response["message"],
            "Username, password and early access code are required"
        );
    }
}

#[tokio::test]
async fn test_register_absent_or_malformed_body() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());

    // No body and no content-type
    let (status, body) = request(&router, "POST", "/api/register", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Username, password and early access code are required"
    );

    // Empty and truncated JSON bodies get the same field-validation response
    for raw in ["", "{"] {
        let (status, body) = request_raw_body(
            &router,
            "POST",
            "/api/register",
            Some("application/json"),
            raw,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {:?}", raw);
        assert_eq!(
            body["message"],
            "Username, password and early access code are required"
        );
    }
}

#[tokio::test]
async fn test_register_wrong_access_code() {
    let storage = MockObjectStore::new();
    let users = MockCredentialStore::new();
    let router = test_router(storage.clone(), users.clone());

    let (status, body) = request(
        &router,
        "POST",
        "/api/register",
        None,
        Some(json!({
            "username": "alice",
            "password": "hunter22",
            "earlyAccessSecret": "not-the-code",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "The early access code you entered is not correct."
    );
    assert!(!users.contains("alice"));
}

#[tokio::test]
async fn test_register_invalid_usernames_rejected_before_any_backend_call() {
    let storage = MockObjectStore::new();
    let users = MockCredentialStore::new();
    let router = test_router(storage.clone(), users.clone());

    let long_name = "a".repeat(64);
    let invalid_usernames = ["Alice", "bob_smith", "ab", long_name.as_str(), "dot.name"];

    for username in invalid_usernames {
        let (status, _) = request(
            &router,
            "POST",
            "/api/register",
            None,
            Some(register_body(username)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted: {}", username);
    }

    // Neither the store nor the storage provider was ever consulted
    assert_eq!(users.lookup_count(), 0);
    assert_eq!(storage.probe_count(), 0);
}

// =============================================================================
// Conflicts
// =============================================================================

#[tokio::test]
async fn test_register_duplicate_username() {
    let router = test_router(MockObjectStore::new(), MockCredentialStore::new());

    let (status, _) = request(
        &router,
        "POST",
        "/api/register",
        None,
        Some(register_body("alice")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(
        &router,
        "POST",
        "/api/register",
        None,
        Some(register_body("alice")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn test_register_bucket_name_claimed_by_foreign_account() {
    let storage = MockObjectStore::new().with_foreign_bucket("taken-name");
    let users = MockCredentialStore::new();
    let router = test_router(storage, users.clone());

    let (status, body) = request(
        &router,
        "POST",
        "/api/register",
        None,
        Some(register_body("taken-name")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("can not be assigned"));
    assert!(!users.contains("taken-name"));
}

// =============================================================================
// Partial Failure
// =============================================================================

#[tokio::test]
async fn test_bucket_creation_failure_leaves_credential_row() {
    let storage = MockObjectStore::new();
    let users = MockCredentialStore::new();
    let router = test_router(storage.clone(), users.clone());

    storage.set_failing_bucket_creation(true);

    let (status, body) = request(
        &router,
        "POST",
        "/api/register",
        None,
        Some(register_body("alice")),
    )
    .await;

    // The row commits before bucket creation and is not rolled back
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error registering user");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("bucket creation failure"));
    assert!(users.contains("alice"));
    assert!(!storage.bucket_exists("alice"));

    // A retry is rejected as a duplicate even though no bucket exists,
    // regardless of whether bucket creation would now succeed
    storage.set_failing_bucket_creation(false);

    let (status, body) = request(
        &router,
        "POST",
        "/api/register",
        None,
        Some(register_body("alice")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");
    assert!(!storage.bucket_exists("alice"));
}
