use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path},
    http::StatusCode,
    Extension, Json,
};
use backend_storage::video::VideoRecord;
use tracing::instrument;

use crate::{
    middleware::AuthenticatedUser,
    types::{AppError, ContentLength},
    upload::{validator, AssetKind, AssetPipeline, RawPayload, UploadError, UploadRequest},
};

/// Upload a thumbnail for a video
///
/// Accepts a `multipart/form-data` body with a `thumbnail` file field
/// (`image/jpeg` or `image/png`, up to 10 MiB). The image is served from
/// `/assets` and the video's `thumbnail_url` is pointed at it.
#[instrument(skip_all, fields(video_id = %video_id, user_id = %user.user_id))]
pub async fn upload_thumbnail(
    Extension(pipeline): Extension<Arc<AssetPipeline>>,
    user: AuthenticatedUser,
    Path(video_id): Path<String>,
    content_length: ContentLength,
    multipart: Multipart,
) -> Result<Json<VideoRecord>, AppError> {
    upload_asset(
        &pipeline,
        AssetKind::Thumbnail,
        user,
        video_id,
        content_length,
        multipart,
    )
    .await
}

/// Upload the video file for a video
///
/// Accepts a `multipart/form-data` body with a `video` file field
/// (`video/mp4`, up to 1 GiB). The file is stored in the video bucket and the
/// video's `video_url` is pointed at it.
#[instrument(skip_all, fields(video_id = %video_id, user_id = %user.user_id))]
pub async fn upload_video(
    Extension(pipeline): Extension<Arc<AssetPipeline>>,
    user: AuthenticatedUser,
    Path(video_id): Path<String>,
    content_length: ContentLength,
    multipart: Multipart,
) -> Result<Json<VideoRecord>, AppError> {
    upload_asset(
        &pipeline,
        AssetKind::Video,
        user,
        video_id,
        content_length,
        multipart,
    )
    .await
}

async fn upload_asset(
    pipeline: &AssetPipeline,
    kind: AssetKind,
    user: AuthenticatedUser,
    video_id: String,
    ContentLength(content_length): ContentLength,
    mut multipart: Multipart,
) -> Result<Json<VideoRecord>, AppError> {
    // Reject oversized requests before any of the body is read
    validator::check_request_length(kind, content_length)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(kind, &e))?
    {
        if field.name() != Some(kind.form_field()) {
            continue;
        }
        // A plain text field under the file's name carries no file
        if field.file_name().is_none() {
            return Err(UploadError::MissingPayload.into());
        }

        let media_type = field.content_type().map(ToString::to_string);
        let record = pipeline
            .run(UploadRequest {
                video_id,
                caller_id: user.user_id,
                kind,
                payload: Some(RawPayload {
                    declared_size: None,
                    media_type,
                    body: field,
                }),
            })
            .await?;

        return Ok(Json(record));
    }

    Err(UploadError::MissingPayload.into())
}

fn multipart_error(kind: AssetKind, err: &MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return UploadError::PayloadTooLarge {
            limit: kind.max_bytes(),
        }
        .into();
    }

    tracing::debug!("Malformed multipart body: {err}");
    AppError::new(
        StatusCode::BAD_REQUEST,
        "malformed_multipart",
        "Request body is not valid multipart form data",
        false,
    )
}
