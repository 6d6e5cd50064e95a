//! S3-backed implementation of [`ObjectStore`].
//!
//! Works against AWS S3 as well as S3-compatible services (MinIO, etc.) when
//! a custom endpoint is configured.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CorsConfiguration, CorsRule, CreateBucketConfiguration,
};
use aws_sdk_s3::Client;
use tracing::debug;

use super::ObjectStore;
use crate::error::StorageError;

/// CORS max-age applied to per-user buckets, in seconds.
const BUCKET_CORS_MAX_AGE_SECS: i32 = 3000;

/// Object storage adapter backed by S3.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    region: String,
}

impl S3ObjectStore {
    /// Create a new adapter from an S3 client.
    ///
    /// The region is needed for bucket creation: outside `us-east-1` the
    /// CreateBucket call requires an explicit location constraint.
    pub fn new(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    /// Get the configured region.
    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn bucket_name_taken(&self, bucket: &str) -> Result<bool, StorageError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            // The bucket exists and we can access it, so it is ours.
            Ok(_) => Ok(false),
            Err(e) => classify_head_bucket_error(&e),
        }
    }

    async fn create_user_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 is the default location and must not be sent as a constraint
        if self.region != "us-east-1" {
            let constraint = BucketLocationConstraint::from(self.region.as_str());
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(constraint)
                    .build(),
            );
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        // Allow unauthenticated PUT from any origin so browsers can upload
        // directly to the pre-signed URLs we hand out.
        let rule = CorsRule::builder()
            .allowed_headers("*")
            .allowed_methods("PUT")
            .allowed_origins("*")
            .max_age_seconds(BUCKET_CORS_MAX_AGE_SECS)
            .build()
            .map_err(|e| StorageError::S3(e.to_string()))?;

        let cors = CorsConfiguration::builder()
            .cors_rules(rule)
            .build()
            .map_err(|e| StorageError::S3(e.to_string()))?;

        self.client
            .put_bucket_cors()
            .bucket(bucket)
            .cors_configuration(cors)
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        debug!(bucket = bucket, "bucket created with upload CORS rule");

        Ok(())
    }

    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket).max_keys(1000);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let result = request.send().await.map_err(|e| {
                let err_str = e.to_string();
                if err_str.contains("NoSuchBucket") {
                    StorageError::BucketNotFound(bucket.to_string())
                } else {
                    StorageError::S3(err_str)
                }
            })?;

            for obj in result.contents() {
                if let Some(key) = obj.key() {
                    keys.push(key.to_string());
                }
            }

            if result.is_truncated() == Some(true) {
                continuation_token = result.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        Ok(keys)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(())
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let config =
            PresigningConfig::expires_in(ttl).map_err(|e| StorageError::Presign(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    async fn presigned_put_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let config =
            PresigningConfig::expires_in(ttl).map_err(|e| StorageError::Presign(e.to_string()))?;

        let presigned = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}

/// Classify a HeadBucket failure into bucket-name availability.
///
/// A 404 (or a modeled not-found service error) means the name is free; a
/// 403 means the bucket exists under another account. Anything else is a
/// genuine provider error and propagates.
fn classify_head_bucket_error(e: &SdkError<HeadBucketError>) -> Result<bool, StorageError> {
    let is_not_found = e
        .as_service_error()
        .map(|se| se.is_not_found())
        .unwrap_or(false);
    if is_not_found {
        return Ok(false);
    }

    match e.raw_response().map(|r| r.status().as_u16()) {
        Some(403) => Ok(true),
        Some(404) => Ok(false),
        _ => Err(StorageError::S3(e.to_string())),
    }
}

/// Create an S3 client, optionally pointed at a custom endpoint.
///
/// For S3-compatible services pass the endpoint URL:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
///
/// For AWS S3, pass `None` to use the default endpoint:
/// ```ignore
/// let client = create_s3_client(None, "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // For S3-compatible services, we often need to use path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
