//! Configuration management.
//!
//! Configuration comes from command-line arguments via clap, with
//! environment-variable fallbacks under the `STASHBOX_` prefix and sensible
//! defaults for all optional settings. Secrets are resolved once at process
//! start; there is no rotation or reload.
//!
//! # Environment Variables
//!
//! - `STASHBOX_HOST` - Server bind address (default: 0.0.0.0)
//! - `STASHBOX_PORT` - Server port (default: 3000)
//! - `STASHBOX_DATABASE_URL` - Postgres connection URL (required)
//! - `STASHBOX_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `STASHBOX_S3_REGION` - AWS region (default: us-east-1)
//! - `STASHBOX_JWT_SECRET` - Secret for signing bearer tokens (required)
//! - `STASHBOX_EARLY_ACCESS_SECRET` - Registration access code (required)
//! - `STASHBOX_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

// =============================================================================
// CLI
// =============================================================================

/// Stashbox - multi-tenant file storage API.
///
/// Serves a per-user bucket file API over S3 or S3-compatible storage with
/// password login and pre-signed upload/download URLs.
#[derive(Parser, Debug, Clone)]
#[command(name = "stashbox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API server.
    Serve(ServeConfig),

    /// Check connectivity to the database and object storage.
    Check(CheckConfig),
}

// =============================================================================
// Serve Configuration
// =============================================================================

/// Configuration for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "STASHBOX_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "STASHBOX_PORT")]
    pub port: u16,

    // =========================================================================
    // Database Configuration
    // =========================================================================
    /// Postgres connection URL for the credential store.
    #[arg(long, env = "STASHBOX_DATABASE_URL")]
    pub database_url: String,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    ///
    /// If not specified, uses the default AWS S3 endpoint.
    #[arg(long, env = "STASHBOX_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "STASHBOX_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret key for signing bearer tokens.
    #[arg(long, env = "STASHBOX_JWT_SECRET")]
    pub jwt_secret: String,

    /// Early-access code required for registration.
    #[arg(long, env = "STASHBOX_EARLY_ACCESS_SECRET")]
    pub early_access_secret: String,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "STASHBOX_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err(
                "Database URL is required. Set --database-url or STASHBOX_DATABASE_URL"
                    .to_string(),
            );
        }

        if self.jwt_secret.is_empty() {
            return Err(
                "JWT secret is required. Set --jwt-secret or STASHBOX_JWT_SECRET".to_string(),
            );
        }

        if self.jwt_secret.len() < 32 {
            return Err("JWT secret must be at least 32 bytes".to_string());
        }

        if self.early_access_secret.is_empty() {
            return Err(
                "Early-access secret is required. Set --early-access-secret or \
                 STASHBOX_EARLY_ACCESS_SECRET"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Check Configuration
// =============================================================================

/// Configuration for the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// Postgres connection URL for the credential store.
    #[arg(long, env = "STASHBOX_DATABASE_URL")]
    pub database_url: String,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "STASHBOX_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "STASHBOX_S3_REGION")]
    pub s3_region: String,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
