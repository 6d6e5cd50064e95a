//! Bearer-token authentication.
//!
//! Tokens are HMAC-signed JWTs (HS256) binding a username. They are issued
//! on successful registration or login, expire after one hour, and are
//! verified statelessly on every protected request. There is no revocation
//! list; a leaked token stays valid until it expires.
//!
//! # Request Flow
//!
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! The guard rejects requests in two distinct ways:
//!
//! - `401` "No or invalid authorization header" when the header is absent
//!   or not of the `Bearer <token>` form
//! - `401` "Invalid or expired token" when the header is well-formed but
//!   the token fails signature or expiry verification
//!
//! On success the bound username is inserted into the request extensions as
//! [`AuthUser`] for the handlers to consume.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

// =============================================================================
// Types
// =============================================================================

/// How long issued tokens stay valid (1 hour).
pub const TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Authentication error types.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// Authorization header is absent or not of the form `Bearer <token>`
    MissingHeader,

    /// Token failed signature or expiry verification
    InvalidToken,

    /// Token could not be created (signing failure)
    TokenCreation,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingHeader => {
                write!(f, "Unauthorized: No or invalid authorization header.")
            }
            AuthError::InvalidToken => write!(f, "Unauthorized: Invalid or expired token"),
            AuthError::TokenCreation => write!(f, "Failed to create token"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingHeader | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::TokenCreation => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // A bad token could indicate a forgery attempt, log at warn.
        // A missing header is usually a misconfigured client, log at debug.
        match &self {
            AuthError::InvalidToken => {
                warn!(status = status.as_u16(), "Authentication failed: {}", self);
            }
            _ => {
                debug!(status = status.as_u16(), "Authentication failed: {}", self);
            }
        }

        let body = Json(json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}

/// JWT claims carried by issued tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token is bound to
    pub sub: String,

    /// Issued-at timestamp (Unix epoch seconds)
    pub iat: u64,

    /// Expiry timestamp (Unix epoch seconds)
    pub exp: u64,
}

/// The authenticated tenant, inserted into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

// =============================================================================
// Token Service
// =============================================================================

/// Issues and verifies signed, time-limited bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create a new token service with the given signing secret.
    ///
    /// The secret should be at least 32 bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            ttl: TOKEN_TTL,
        }
    }

    /// Issue a token for the given username, expiring after [`TOKEN_TTL`].
    pub fn issue(&self, username: &str) -> Result<String, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        self.issue_at(username, now, now + self.ttl.as_secs())
    }

    /// Issue a token with explicit issued-at and expiry timestamps.
    ///
    /// Useful for generating tokens for a specific time, e.g. in tests.
    pub fn issue_at(&self, username: &str, iat: u64, exp: u64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: username.to_string(),
            iat,
            exp,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenCreation)
    }

    /// Verify a token's signature and expiry, returning the bound username.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(data.claims.sub)
    }
}

// =============================================================================
// Bearer Extraction
// =============================================================================

/// Extract the bearer token from the `Authorization` header.
///
/// Header name lookup is case-insensitive (the header map guarantees that);
/// the `Bearer ` scheme prefix is matched exactly.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    let value = value.to_str().map_err(|_| AuthError::MissingHeader)?;

    value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingHeader)
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware guarding authenticated routes.
///
/// Extracts and verifies the bearer token before any protected handler runs.
/// On success the bound username is made available to handlers via the
/// [`AuthUser`] extension; on failure the request is rejected with `401` and
/// never reaches a handler.
pub async fn auth_middleware(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let username = {
        let token = bearer_token(request.headers())?;
        tokens.verify(token)?
    };

    request.extensions_mut().insert(AuthUser(username));

    Ok(next.run(request).await)
}

// =============================================================================
// Tests
// =============================================================================
