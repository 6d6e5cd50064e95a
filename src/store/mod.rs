//! Credential store.
//!
//! Users live in a single relational table keyed by username. The
//! [`CredentialStore`] trait is the seam between the HTTP handlers and the
//! database so the handlers can be tested against an in-memory mock; the
//! production implementation is [`PgCredentialStore`].

mod postgres;

pub use postgres::PgCredentialStore;

use async_trait::async_trait;

use crate::error::StoreError;

/// A registered user row.
///
/// Rows are created on registration and never updated or deleted by this
/// service. The username doubles as the tenant identifier and the name of
/// the user's storage bucket.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Auto-assigned unique id
    pub id: i64,

    /// Unique username, also the bucket name
    pub username: String,

    /// bcrypt hash of the user's password
    pub password_hash: String,
}

/// Abstraction over the credential store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a new user row. The id is assigned by the database.
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<(), StoreError>;
}
