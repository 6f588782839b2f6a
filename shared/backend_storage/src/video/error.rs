//! Error types for video record storage operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{get_item::GetItemError, update_item::UpdateItemError};
use thiserror::Error;

/// Result type alias for video record storage operations
pub type VideoStorageResult<T> = Result<T, VideoStorageError>;

/// Storage error types for video record operations
#[derive(Debug, Error)]
pub enum VideoStorageError {
    /// Failed to update video record in `DynamoDB`
    #[error("Failed to update video record in DynamoDB: {0:?}")]
    DynamoDbUpdateError(#[from] SdkError<UpdateItemError>),

    /// Failed to get video record from `DynamoDB`
    #[error("Failed to get video record from DynamoDB: {0:?}")]
    DynamoDbGetError(#[from] SdkError<GetItemError>),

    /// The record does not exist at write time
    #[error("Video record does not exist: {0}")]
    RecordMissing(String),

    /// Record store could not be reached
    #[error("Video record store unavailable: {0}")]
    Unavailable(String),

    /// Failed to parse video record from `DynamoDB` item
    #[error("Failed to parse video record: {0}")]
    SerializationError(String),
}

impl From<serde_dynamo::Error> for VideoStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
