//! # Stashbox
//!
//! A minimal multi-tenant file-storage API backed by S3-compatible object
//! storage. Users register with an early-access code, receive a storage
//! bucket named after their username, authenticate with a password, and
//! move files in and out through time-limited pre-signed URLs.
//!
//! ## Features
//!
//! - **Per-user buckets**: the username is the tenant id and the bucket name
//! - **Stateless auth**: HMAC-signed bearer tokens, 1-hour expiry
//! - **Direct uploads/downloads**: 5-minute pre-signed URLs, so file bytes
//!   never pass through this service
//! - **Early-access gating**: registration requires a shared access code
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`store`] - Credential store (Postgres users table)
//! - [`storage`] - Object storage adapter (S3 buckets, pre-signed URLs)
//! - [`server`] - Axum-based HTTP server, auth guard, and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use stashbox::{create_router, create_s3_client, RouterConfig};
//! use stashbox::storage::S3ObjectStore;
//! use stashbox::store::PgCredentialStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client(None, "us-east-1").await;
//!     let storage = S3ObjectStore::new(client, "us-east-1");
//!
//!     let pool = sqlx::PgPool::connect("postgres://localhost/stashbox")
//!         .await
//!         .expect("database connection");
//!     let users = PgCredentialStore::new(pool);
//!
//!     let config = RouterConfig::new("jwt-signing-secret", "early-access-code");
//!     let router = create_router(storage, users, config);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, ServeConfig};
pub use error::{StorageError, StoreError};
pub use server::{
    auth_middleware, create_router, health_handler, ApiError, AppState, AuthError, AuthUser,
    Claims, FilesResponse, HealthResponse, LoginRequest, MessageResponse, Payload,
    RegisterRequest, RouterConfig, TokenResponse, TokenService, UrlResponse, BCRYPT_COST,
    TOKEN_TTL,
};
pub use storage::{
    create_s3_client, is_valid_bucket_name, ObjectStore, S3ObjectStore, MAX_BUCKET_NAME_LEN,
    MIN_BUCKET_NAME_LEN, SIGNED_URL_TTL,
};
pub use store::{CredentialStore, PgCredentialStore, UserRecord};
