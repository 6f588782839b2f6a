//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::upload::UploadError;

/// API error response envelope
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: &'static str,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(
        status: StatusCode,
        code: &'static str,
        msg: &'static str,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody { code, message: msg },
            },
        }
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.error.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert upload pipeline errors to application errors
impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        use UploadError::{
            Forbidden, MissingPayload, PayloadTooLarge, PersistenceError, PromotionError,
            RecordNotFound, StagingWriteError, UnsupportedMediaType,
        };

        match &err {
            MissingPayload => Self::new(
                StatusCode::BAD_REQUEST,
                "missing_payload",
                "Upload file missing from form data",
                false,
            ),
            PayloadTooLarge { limit } => {
                tracing::debug!("Payload over {limit} bytes rejected");
                Self::new(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "payload_too_large",
                    "Upload exceeds the size limit for this asset",
                    false,
                )
            }
            UnsupportedMediaType(media_type) => {
                tracing::debug!("Media type rejected: {media_type}");
                Self::new(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "unsupported_media_type",
                    "File type not allowed for this asset",
                    false,
                )
            }
            RecordNotFound(_) => Self::new(
                StatusCode::NOT_FOUND,
                "video_not_found",
                "Couldn't find video",
                false,
            ),
            Forbidden => Self::new(
                StatusCode::FORBIDDEN,
                "forbidden",
                "Only the video owner can upload assets",
                false,
            ),
            StagingWriteError(msg) => {
                tracing::error!("Staging error: {msg}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                    true,
                )
            }
            PromotionError(msg) => {
                tracing::error!("Promotion error: {msg}");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "Asset storage temporarily unavailable",
                    true,
                )
            }
            PersistenceError(msg) => {
                tracing::error!("Persistence error: {msg}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "persistence_error",
                    "Video store temporarily unavailable",
                    true,
                )
            }
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
