//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        /api/register  /api/login  /api/files[/{key}]            │
//! │                                                                 │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────────────┐  │
//! │  │  handlers   │  │     auth     │  │        routes          │  │
//! │  │ (requests)  │  │(bearer token)│  │   (router config)      │  │
//! │  └─────────────┘  └──────────────┘  └────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{auth_middleware, AuthError, AuthUser, Claims, TokenService, TOKEN_TTL};
pub use handlers::{
    health_handler, ApiError, AppState, FilesResponse, HealthResponse, LoginRequest,
    MessageResponse, Payload, RegisterRequest, TokenResponse, UrlResponse, BCRYPT_COST,
};
pub use routes::{create_router, RouterConfig};
