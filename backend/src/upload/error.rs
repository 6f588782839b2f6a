//! Error types for the asset upload pipeline

use thiserror::Error;

/// Result type for upload pipeline operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can end an upload
///
/// The first five are caller-facing and never retried. The last three come from
/// infrastructure and are surfaced as-is.
#[derive(Error, Debug)]
pub enum UploadError {
    /// The expected form field or file was not sent
    #[error("Upload payload missing")]
    MissingPayload,

    /// Declared or measured size exceeds the ceiling for the asset kind
    #[error("Payload exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// Ceiling that was exceeded, in bytes
        limit: u64,
    },

    /// Declared media type is not on the allow-list for the asset kind
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// No video record exists for the ID
    #[error("Video not found: {0}")]
    RecordNotFound(String),

    /// Caller does not own the video
    #[error("Caller does not own the video")]
    Forbidden,

    /// Payload could not be written to the staging area
    #[error("Failed to stage upload: {0}")]
    StagingWriteError(String),

    /// Staged bytes could not be copied to durable storage
    #[error("Failed to promote asset: {0}")]
    PromotionError(String),

    /// Video record could not be read or written
    #[error("Failed to persist video record: {0}")]
    PersistenceError(String),
}

impl UploadError {
    /// Whether the failure was caused by the caller's input or identity
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingPayload
                | Self::PayloadTooLarge { .. }
                | Self::UnsupportedMediaType(_)
                | Self::RecordNotFound(_)
                | Self::Forbidden
        )
    }
}
