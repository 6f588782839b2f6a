//! Video record storage using `DynamoDB`
//!
//! A video record is created elsewhere and owned by exactly one user. This module only
//! reads records and sets a single asset reference after that asset has been promoted.

mod error;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::SdkError,
    types::{AttributeValue, ReturnValue},
    Client as DynamoDbClient,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::Display;

pub use error::{VideoStorageError, VideoStorageResult};

/// Video record as stored in the videos table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VideoRecord {
    /// Primary key - unique video ID
    pub id: String,
    /// ID of the owning user, immutable after creation
    pub user_id: String,
    /// Video title
    pub title: String,
    /// Video description
    #[serde(default)]
    pub description: String,
    /// Timestamp of record creation
    pub created_at: i64,
    /// Timestamp of the last asset reference change, 0 if never changed
    #[serde(default)]
    pub updated_at: i64,
    /// URL of the current thumbnail asset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// URL of the current video asset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// `DynamoDB` attribute names for the videos table
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum VideoAttribute {
    /// Primary key - unique video ID
    Id,
    /// Owning user ID
    UserId,
    /// Video title
    Title,
    /// Video description
    Description,
    /// Creation timestamp
    CreatedAt,
    /// Last update timestamp
    UpdatedAt,
    /// Thumbnail asset URL
    ThumbnailUrl,
    /// Video asset URL
    VideoUrl,
}

/// Which asset reference of a record to set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AssetRef {
    /// `thumbnail_url`
    Thumbnail,
    /// `video_url`
    Video,
}

impl AssetRef {
    /// Attribute holding this reference
    #[must_use]
    pub const fn attribute(self) -> VideoAttribute {
        match self {
            Self::Thumbnail => VideoAttribute::ThumbnailUrl,
            Self::Video => VideoAttribute::VideoUrl,
        }
    }
}

/// Read/write access to video records
///
/// Writes touch one asset reference (plus `updated_at`) atomically per record, so
/// concurrent uploads of different asset kinds for the same video never clobber
/// each other.
#[async_trait]
pub trait VideoRecordStore: Send + Sync {
    /// Fetches a record by ID, `None` if it does not exist
    ///
    /// # Errors
    ///
    /// Returns `VideoStorageError` if the store cannot be read
    async fn get(&self, video_id: &str) -> VideoStorageResult<Option<VideoRecord>>;

    /// Sets one asset reference of an existing record and returns the record as stored
    ///
    /// Every other attribute is left as it is in the store, not as the caller last
    /// read it.
    ///
    /// # Errors
    ///
    /// Returns `VideoStorageError::RecordMissing` if the record no longer exists,
    /// or another `VideoStorageError` if the write fails
    async fn set_asset_ref(
        &self,
        video_id: &str,
        asset: AssetRef,
        reference: &str,
    ) -> VideoStorageResult<VideoRecord>;
}

/// Storage client for video records backed by `DynamoDB`
pub struct VideoStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl VideoStorage {
    /// Creates a new storage instance
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client
    /// * `table_name` - `DynamoDB` table name for videos
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }
}

#[async_trait]
impl VideoRecordStore for VideoStorage {
    async fn get(&self, video_id: &str) -> VideoStorageResult<Option<VideoRecord>> {
        let response = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .key(
                VideoAttribute::Id.to_string(),
                AttributeValue::S(video_id.to_string()),
            )
            .consistent_read(true)
            .send()
            .await?;

        response
            .item()
            .map(|item| serde_dynamo::from_item(item.clone()).map_err(VideoStorageError::from))
            .transpose()
    }

    async fn set_asset_ref(
        &self,
        video_id: &str,
        asset: AssetRef,
        reference: &str,
    ) -> VideoStorageResult<VideoRecord> {
        let now = chrono::Utc::now().timestamp();

        let response = self
            .dynamodb_client
            .update_item()
            .table_name(&self.table_name)
            .key(
                VideoAttribute::Id.to_string(),
                AttributeValue::S(video_id.to_string()),
            )
            .update_expression("SET #asset = :reference, #updated_at = :now")
            .condition_expression("attribute_exists(#pk)")
            .expression_attribute_names("#pk", VideoAttribute::Id.to_string())
            .expression_attribute_names("#asset", asset.attribute().to_string())
            .expression_attribute_names("#updated_at", VideoAttribute::UpdatedAt.to_string())
            .expression_attribute_values(":reference", AttributeValue::S(reference.to_string()))
            .expression_attribute_values(":now", AttributeValue::N(now.to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    VideoStorageError::RecordMissing(video_id.to_string())
                } else {
                    err.into()
                }
            })?;

        let item = response.attributes().ok_or_else(|| {
            VideoStorageError::SerializationError("update returned no attributes".to_string())
        })?;
        let record: VideoRecord = serde_dynamo::from_item(item.clone())?;

        tracing::debug!(video_id = %video_id, asset = %asset, "video asset reference updated");

        Ok(record)
    }
}
