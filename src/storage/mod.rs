//! Object storage layer.
//!
//! Each registered user owns exactly one bucket named after their username,
//! so bucket names must satisfy the provider's naming rules and must not
//! collide with buckets owned by other accounts. The [`ObjectStore`] trait
//! is the seam between the HTTP handlers and the provider; the production
//! implementation is [`S3ObjectStore`].

mod s3;

pub use s3::{create_s3_client, S3ObjectStore};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageError;

/// How long pre-signed upload/download URLs stay valid (5 minutes).
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(300);

/// Minimum bucket (and therefore username) length.
pub const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket (and therefore username) length.
pub const MAX_BUCKET_NAME_LEN: usize = 63;

/// Check whether a name is usable as a per-user bucket name.
///
/// The enforced rule is the intersection of our username policy and S3
/// bucket naming: lowercase ASCII letters, digits, and hyphens, with a
/// length between 3 and 63 characters.
pub fn is_valid_bucket_name(name: &str) -> bool {
    if name.len() < MIN_BUCKET_NAME_LEN || name.len() > MAX_BUCKET_NAME_LEN {
        return false;
    }

    name.bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Abstraction over the object-storage provider.
///
/// One implementation talks to S3 ([`S3ObjectStore`]); integration tests use
/// an in-memory mock.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether the bucket name is claimed by a foreign account.
    ///
    /// Returns `true` when the bucket exists but is inaccessible to us
    /// (owned by someone else), `false` when it does not exist or we own it.
    /// Any other provider error propagates.
    async fn bucket_name_taken(&self, bucket: &str) -> Result<bool, StorageError>;

    /// Create the per-user bucket and configure it to accept `PUT` from any
    /// origin, which direct browser uploads via pre-signed URLs require.
    async fn create_user_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// List every object key in the bucket.
    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError>;

    /// Delete a single object.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// Generate a time-limited pre-signed URL for downloading `key`.
    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    /// Generate a time-limited pre-signed URL for uploading `key`.
    async fn presigned_put_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StorageError>;
}

// =============================================================================
// Tests
// =============================================================================
