use thiserror::Error;

/// Errors from the object-storage provider.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Bucket does not exist
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Failed to generate a pre-signed URL
    #[error("Presigning error: {0}")]
    Presign(String),
}

/// Errors from the credential store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Database connectivity or query error
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}
