//! Binds the caller to the video's recorded owner

use backend_storage::video::{VideoRecord, VideoRecordStore};
use tracing::{instrument, warn};

use super::{UploadError, UploadResult};

/// Fetches the video and confirms `caller_id` owns it
///
/// # Errors
///
/// * `UploadError::RecordNotFound` - no record for `video_id`
/// * `UploadError::Forbidden` - the record belongs to someone else
/// * `UploadError::PersistenceError` - the record store could not be read
#[instrument(skip(records))]
pub async fn authorize(
    records: &dyn VideoRecordStore,
    video_id: &str,
    caller_id: &str,
) -> UploadResult<VideoRecord> {
    let record = records
        .get(video_id)
        .await
        .map_err(|e| UploadError::PersistenceError(e.to_string()))?
        .ok_or_else(|| UploadError::RecordNotFound(video_id.to_string()))?;

    if record.user_id != caller_id {
        warn!(owner_id = %record.user_id, "upload attempted by non-owner");
        return Err(UploadError::Forbidden);
    }

    Ok(record)
}
