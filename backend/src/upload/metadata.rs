//! Points the video record at a promoted asset

use backend_storage::video::{AssetRef, VideoRecord, VideoRecordStore};
use tracing::{info, instrument};

use super::{AssetKind, UploadError, UploadResult};

const fn asset_ref(kind: AssetKind) -> AssetRef {
    match kind {
        AssetKind::Thumbnail => AssetRef::Thumbnail,
        AssetKind::Video => AssetRef::Video,
    }
}

/// Sets the asset reference for `kind` and returns the record as stored
///
/// Only the one reference is written, so an overlapping upload of the other asset
/// kind keeps its own reference. Only call this once the object behind `reference`
/// exists.
///
/// # Errors
///
/// Returns `UploadError::PersistenceError` if the record store rejects the write
#[instrument(skip(records, reference))]
pub async fn point_at(
    records: &dyn VideoRecordStore,
    video_id: &str,
    kind: AssetKind,
    reference: &str,
) -> UploadResult<VideoRecord> {
    let record = records
        .set_asset_ref(video_id, asset_ref(kind), reference)
        .await
        .map_err(|e| UploadError::PersistenceError(e.to_string()))?;

    info!("video record points at new {kind}");

    Ok(record)
}
