//! Postgres-backed implementation of [`CredentialStore`].
//!
//! Expects the following schema (provisioned outside this service):
//!
//! ```sql
//! CREATE TABLE users (
//!     id            BIGSERIAL PRIMARY KEY,
//!     username      TEXT NOT NULL UNIQUE,
//!     password_hash TEXT NOT NULL
//! );
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::{CredentialStore, UserRecord};
use crate::error::StoreError;

/// Credential store over a pooled Postgres connection.
///
/// Connections are acquired from the pool for the duration of each query and
/// returned on drop, whether the query succeeds or fails.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query("SELECT id, username, password_hash FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| UserRecord {
            id: r.get("id"),
            username: r.get("username"),
            password_hash: r.get("password_hash"),
        }))
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (username, password_hash) VALUES ($1, $2)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
