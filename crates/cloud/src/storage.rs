//! S3-compatible object storage gateway.

use std::time::Duration;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use serde::Serialize;

use crate::config::StorageConfig;
use crate::error::CloudError;

/// A time-limited URL the client can `PUT` the object to directly.
#[derive(Debug, Clone, Serialize)]
pub struct PresignedUpload {
    pub url: String,
    pub key: String,
    pub expires_in_secs: u64,
}

/// Object storage operations used by the publish pipeline and the API.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Issue a presigned `PUT` URL for `key`, valid for `ttl`.
    async fn issue_presigned_upload(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUpload, CloudError>;

    /// Upload an object through the server.
    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), CloudError>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete_object(&self, key: &str) -> Result<(), CloudError>;
}

/// [`StorageGateway`] backed by the AWS SDK.
///
/// Works against AWS S3 and S3-compatible stores (R2, MinIO) when an
/// explicit endpoint is configured.
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Build a client from configuration.
    ///
    /// Static credentials are used when both key parts are configured;
    /// otherwise the default AWS credential chain applies. A custom endpoint
    /// switches the client to path-style addressing.
    pub async fn new(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "vidhub_static",
            ));
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        }
    }

    /// Wrap an already configured client.
    pub fn with_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl StorageGateway for S3Storage {
    async fn issue_presigned_upload(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUpload, CloudError> {
        let presigning = PresigningConfig::builder()
            .expires_in(ttl)
            .build()
            .map_err(|e| CloudError::Storage(format!("Invalid presigning config: {e}")))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| {
                CloudError::Storage(format!(
                    "Failed to presign upload for {key}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(PresignedUpload {
            url: request.uri().to_string(),
            key: key.to_string(),
            expires_in_secs: ttl.as_secs(),
        })
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), CloudError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                CloudError::Storage(format!("Failed to upload {key}: {}", DisplayErrorContext(&e)))
            })?;

        tracing::debug!(key, size, "Uploaded object");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), CloudError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                CloudError::Storage(format!("Failed to delete {key}: {}", DisplayErrorContext(&e)))
            })?;

        tracing::debug!(key, "Deleted object");
        Ok(())
    }
}
