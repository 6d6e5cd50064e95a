//! Router configuration for the file-storage API.
//!
//! # Route Structure
//!
//! ```text
//! POST   /api/register      - Register (public)
//! POST   /api/login         - Login (public)
//! GET    /api/files         - List files (bearer token)
//! PUT    /api/files/{key}   - Upload URL (bearer token)
//! GET    /api/files/{key}   - Download URL (bearer token)
//! DELETE /api/files/{key}   - Delete file (bearer token)
//! GET    /health            - Health check (public)
//! ```
//!
//! Any other (method, path) combination returns `404 {"message": "Not Found"}`,
//! including a known path with an unsupported method.

use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::storage::ObjectStore;
use crate::store::CredentialStore;

use super::auth::{auth_middleware, TokenService};
use super::handlers::{
    delete_file, get_download_url, get_upload_url, health_handler, list_files, login,
    missing_file_key, not_found, register, AppState,
};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Secret key for signing bearer tokens
    pub jwt_secret: String,

    /// Shared secret gating registration
    pub early_access_secret: String,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration with the given secrets.
    ///
    /// By default CORS allows any origin and tracing is enabled.
    pub fn new(jwt_secret: impl Into<String>, early_access_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            early_access_secret: early_access_secret.into(),
            cors_origins: None,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Builds the complete Axum router with public register/login routes, the
/// bearer-token middleware on the file routes, CORS, optional request
/// tracing, and 404 fallbacks for unknown paths and unsupported methods.
pub fn create_router<S, C>(storage: S, users: C, config: RouterConfig) -> Router
where
    S: ObjectStore + 'static,
    C: CredentialStore + 'static,
{
    let tokens = TokenService::new(&config.jwt_secret);
    let state = AppState::new(
        storage,
        users,
        tokens.clone(),
        config.early_access_secret.clone(),
    );

    let public_routes = Router::new()
        .route("/api/register", post(register::<S, C>))
        .route("/api/login", post(login::<S, C>))
        .route("/health", get(health_handler))
        .with_state(state.clone());

    // The auth middleware is layered onto the file routes only, so it runs
    // before every protected handler and never touches register/login.
    let protected_routes = Router::new()
        .route("/api/files", get(list_files::<S, C>))
        .route(
            "/api/files/{key}",
            get(get_download_url::<S, C>)
                .put(get_upload_url::<S, C>)
                .delete(delete_file::<S, C>),
        )
        // A trailing slash means the key segment is missing entirely
        .route(
            "/api/files/",
            get(missing_file_key)
                .put(missing_file_key)
                .delete(missing_file_key),
        )
        .with_state(state)
        .layer(middleware::from_fn_with_state(tokens, auth_middleware));

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
