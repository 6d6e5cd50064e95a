//! HTTP request handlers for the file-storage API.
//!
//! # Endpoints
//!
//! - `POST /api/register` - Register a user, provision their bucket
//! - `POST /api/login` - Exchange credentials for a bearer token
//! - `GET /api/files` - List the user's object keys
//! - `PUT /api/files/{key}` - Pre-signed upload URL
//! - `GET /api/files/{key}` - Pre-signed download URL
//! - `DELETE /api/files/{key}` - Delete an object
//! - `GET /health` - Health check

use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{debug, error, info, warn};

use crate::storage::{is_valid_bucket_name, ObjectStore, SIGNED_URL_TTL};
use crate::store::CredentialStore;

use super::auth::{AuthUser, TokenService};

/// bcrypt cost factor for password hashing.
pub const BCRYPT_COST: u32 = 10;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState<S, C> {
    /// Object storage adapter (per-user buckets)
    pub storage: Arc<S>,

    /// Credential store (users table)
    pub users: Arc<C>,

    /// Token issuing/verification service
    pub tokens: TokenService,

    /// Shared secret gating registration
    pub early_access_secret: Arc<String>,
}

impl<S, C> AppState<S, C> {
    /// Create a new application state.
    pub fn new(
        storage: S,
        users: C,
        tokens: TokenService,
        early_access_secret: impl Into<String>,
    ) -> Self {
        Self {
            storage: Arc::new(storage),
            users: Arc::new(users),
            tokens,
            early_access_secret: Arc::new(early_access_secret.into()),
        }
    }
}

impl<S, C> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            users: Arc::clone(&self.users),
            tokens: self.tokens.clone(),
            early_access_secret: Arc::clone(&self.early_access_secret),
        }
    }
}

// =============================================================================
// Request & Response Types
// =============================================================================

/// JSON body extractor that treats an absent or unparseable body as empty.
///
/// A request with no body, no content-type, or a body that fails to parse
/// deserializes to the default (all fields missing), so the handlers' own
/// field validation responds with the route's `400 {"message": ...}` body
/// instead of the stock extractor's plain-text rejection.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(_) => Ok(Payload(T::default())),
        }
    }
}

/// Body of `POST /api/register`.
///
/// All fields are required; they are modeled as options so a missing field
/// produces the API's own 400 message rather than a deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub early_access_secret: Option<String>,
}

/// Body of `POST /api/login`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

/// Successful register/login response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Signed bearer token, 1-hour expiry
    pub token: String,
}

/// Response from the file listing endpoint.
#[derive(Debug, Serialize)]
pub struct FilesResponse {
    /// All object keys in the user's bucket
    pub files: Vec<String>,
}

/// Response carrying a pre-signed URL.
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    /// Pre-signed URL, 5-minute expiry, single operation
    pub url: String,
}

/// Generic message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// API error carrying the HTTP status and the JSON `message` body.
///
/// Infrastructure failures additionally surface the raw underlying error in
/// an `error` field, mirroring what callers of this API have come to rely on.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

impl ApiError {
    /// Create an error with a status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 500 error wrapping an infrastructure failure.
    pub fn internal(message: impl Into<String>, err: impl Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            detail: Some(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // 5xx at error, 404 at debug (common and expected), other 4xx at warn
        if self.status.is_server_error() {
            error!(
                status = self.status.as_u16(),
                detail = self.detail.as_deref().unwrap_or(""),
                "Server error: {}",
                self.message
            );
        } else if self.status == StatusCode::NOT_FOUND {
            debug!(status = self.status.as_u16(), "Not found");
        } else {
            warn!(
                status = self.status.as_u16(),
                "Client error: {}", self.message
            );
        }

        let body = match &self.detail {
            Some(detail) => json!({ "message": self.message, "error": detail }),
            None => json!({ "message": self.message }),
        };

        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Registration
// =============================================================================

/// Handle registration requests.
///
/// # Endpoint
///
/// `POST /api/register` with body `{username, password, earlyAccessSecret}`
///
/// Steps run in order and short-circuit on failure:
///
/// 1. All three fields present, else `400`
/// 2. Early-access code matches the configured secret, else `403`
/// 3. Username satisfies the bucket naming rule, else `400`
/// 4. Bucket name not claimed by a foreign account, else `400`
/// 5. Username not already registered, else `400`
/// 6. Hash the password, insert the credential row
/// 7. Create the user's bucket with the browser-upload CORS rule
/// 8. Issue a token, return `201 {token}`
///
/// The credential insert and the bucket creation are not atomic: if bucket
/// creation fails the row stays committed and the request returns `500`.
pub async fn register<S: ObjectStore, C: CredentialStore>(
    State(state): State<AppState<S, C>>,
    Payload(body): Payload<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let (Some(username), Some(password), Some(code)) =
        (body.username, body.password, body.early_access_secret)
    else {
        return Err(ApiError::bad_request(
            "Username, password and early access code are required",
        ));
    };

    if username.is_empty() || password.is_empty() || code.is_empty() {
        return Err(ApiError::bad_request(
            "Username, password and early access code are required",
        ));
    }

    // Only allow users who got the early access code. Constant-time compare
    // so the secret can't be probed byte by byte.
    let code_matches: bool = code
        .as_bytes()
        .ct_eq(state.early_access_secret.as_bytes())
        .into();
    if !code_matches {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "The early access code you entered is not correct.",
        ));
    }

    // The username becomes the bucket name, so it must satisfy the bucket
    // naming rule. Checked before any database or storage call.
    if !is_valid_bucket_name(&username) {
        return Err(ApiError::bad_request(
            "The username can only contain lowercase letters and slashes. \
             It must be between 3 and 63 characters long.",
        ));
    }

    // Bucket names are global at the provider; reject names claimed by
    // other accounts.
    match state.storage.bucket_name_taken(&username).await {
        Ok(true) => {
            return Err(ApiError::bad_request(
                "This username can not be assigned due to technical reasons. \
                 Please try another one.",
            ));
        }
        Ok(false) => {}
        Err(e) => return Err(ApiError::internal("Error registering user", e)),
    }

    match state.users.find_by_username(&username).await {
        Ok(Some(_)) => return Err(ApiError::bad_request("User already exists")),
        Ok(None) => {}
        Err(e) => return Err(ApiError::internal("Error registering user", e)),
    }

    let password_hash = bcrypt::hash(&password, BCRYPT_COST)
        .map_err(|e| ApiError::internal("Error registering user", e))?;

    state
        .users
        .insert_user(&username, &password_hash)
        .await
        .map_err(|e| ApiError::internal("Error registering user", e))?;

    // The row above stays committed if this fails; there is no rollback.
    state
        .storage
        .create_user_bucket(&username)
        .await
        .map_err(|e| ApiError::internal("Error registering user", e))?;

    info!(username = %username, "user registered, bucket created");

    let token = state
        .tokens
        .issue(&username)
        .map_err(|e| ApiError::internal("Error registering user", e))?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

// =============================================================================
// Login
// =============================================================================

/// Handle login requests.
///
/// # Endpoint
///
/// `POST /api/login` with body `{username, password}`
///
/// An unknown username and a wrong password return the same `400` message
/// so usernames cannot be enumerated.
pub async fn login<S: ObjectStore, C: CredentialStore>(
    State(state): State<AppState<S, C>>,
    Payload(body): Payload<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return Err(ApiError::bad_request("Username and password are required"));
    };

    if username.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let user = state
        .users
        .find_by_username(&username)
        .await
        .map_err(|e| ApiError::internal("Error logging in user", e))?;

    let Some(user) = user else {
        return Err(ApiError::bad_request("Invalid username or password"));
    };

    let password_matches = bcrypt::verify(&password, &user.password_hash)
        .map_err(|e| ApiError::internal("Error logging in user", e))?;

    if !password_matches {
        return Err(ApiError::bad_request("Invalid username or password"));
    }

    let token = state
        .tokens
        .issue(&username)
        .map_err(|e| ApiError::internal("Error logging in user", e))?;

    Ok(Json(TokenResponse { token }))
}

// =============================================================================
// File Handlers
// =============================================================================

/// Handle file listing requests.
///
/// # Endpoint
///
/// `GET /api/files` (authenticated)
///
/// Lists every object key in the caller's bucket. Only keys are exposed, no
/// size/type/etag metadata.
pub async fn list_files<S: ObjectStore, C: CredentialStore>(
    State(state): State<AppState<S, C>>,
    Extension(AuthUser(username)): Extension<AuthUser>,
) -> Result<Json<FilesResponse>, ApiError> {
    let files = state
        .storage
        .list_keys(&username)
        .await
        .map_err(|e| ApiError::internal("Error listing files", e))?;

    Ok(Json(FilesResponse { files }))
}

/// Handle upload URL requests.
///
/// # Endpoint
///
/// `PUT /api/files/{key}` (authenticated)
///
/// Returns a 5-minute pre-signed `PUT` URL scoped to the caller's bucket and
/// the given key. The caller uploads directly to storage; nothing passes
/// through this service.
pub async fn get_upload_url<S: ObjectStore, C: CredentialStore>(
    State(state): State<AppState<S, C>>,
    Extension(AuthUser(username)): Extension<AuthUser>,
    Path(key): Path<String>,
) -> Result<Json<UrlResponse>, ApiError> {
    require_key(&key)?;

    let url = state
        .storage
        .presigned_put_url(&username, &key, SIGNED_URL_TTL)
        .await
        .map_err(|e| ApiError::internal("Error generating signed URL", e))?;

    Ok(Json(UrlResponse { url }))
}

/// Handle download URL requests.
///
/// # Endpoint
///
/// `GET /api/files/{key}` (authenticated)
///
/// Returns a 5-minute pre-signed `GET` URL scoped to the caller's bucket and
/// the given key.
pub async fn get_download_url<S: ObjectStore, C: CredentialStore>(
    State(state): State<AppState<S, C>>,
    Extension(AuthUser(username)): Extension<AuthUser>,
    Path(key): Path<String>,
) -> Result<Json<UrlResponse>, ApiError> {
    require_key(&key)?;

    let url = state
        .storage
        .presigned_get_url(&username, &key, SIGNED_URL_TTL)
        .await
        .map_err(|e| ApiError::internal("Error generating signed URL", e))?;

    Ok(Json(UrlResponse { url }))
}

/// Handle file deletion requests.
///
/// # Endpoint
///
/// `DELETE /api/files/{key}` (authenticated)
pub async fn delete_file<S: ObjectStore, C: CredentialStore>(
    State(state): State<AppState<S, C>>,
    Extension(AuthUser(username)): Extension<AuthUser>,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_key(&key)?;

    state
        .storage
        .delete_object(&username, &key)
        .await
        .map_err(|e| ApiError::internal("Error deleting file", e))?;

    Ok(Json(MessageResponse {
        message: "File deleted successfully".to_string(),
    }))
}

/// Reject requests whose file key segment is empty.
fn require_key(key: &str) -> Result<(), ApiError> {
    if key.is_empty() {
        return Err(ApiError::bad_request("File key is required"));
    }
    Ok(())
}

/// Fallback handler for `/api/files/` with no key segment.
pub async fn missing_file_key() -> ApiError {
    ApiError::bad_request("File key is required")
}

// =============================================================================
// Misc Handlers
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health` (public)
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Fallback for any (method, path) pair that matches no route.
pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not Found")
}

// =============================================================================
// Tests
// =============================================================================
