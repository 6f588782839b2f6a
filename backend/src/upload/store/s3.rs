//! S3-based durable asset storage

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};
use tracing::{debug, info};

use super::{check_key, AssetStore, StoreError, StoreResult};

/// Asset store client for S3 operations
pub struct S3AssetStore {
    s3_client: Arc<S3Client>,
    bucket_name: String,
    region: String,
}

impl S3AssetStore {
    /// Creates a new S3 asset store
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket assets are written to
    /// * `region` - Bucket region, used to build object URLs
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String, region: String) -> Self {
        Self {
            s3_client,
            bucket_name,
            region,
        }
    }

    /// Canonical URL of an object in this store's bucket
    #[must_use]
    pub fn object_url(&self, key: &str) -> String {
        object_url(&self.bucket_name, &self.region, key)
    }
}

/// Virtual-hosted-style URL: `https://<bucket>.s3.<region>.amazonaws.com/<key>`
#[must_use]
pub fn object_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{bucket}.s3.{region}.amazonaws.com/{key}")
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn put(&self, key: &str, source: &Path, content_type: &str) -> StoreResult<String> {
        check_key(key)?;

        debug!(key = %key, source = %source.display(), "uploading staged asset to S3");

        let body = ByteStream::from_path(source).await.map_err(|e| {
            StoreError::AwsError(format!(
                "Failed to open staged file {}: {e}",
                source.display()
            ))
        })?;

        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await?;

        info!(bucket = %self.bucket_name, key = %key, "asset stored in S3");

        Ok(self.object_url(key))
    }
}
