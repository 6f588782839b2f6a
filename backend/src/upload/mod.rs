//! Asset upload pipeline
//!
//! Attaches a thumbnail or video file to an existing video record:
//!
//! 1. Validate declared size and media type
//! 2. Stage the body to a local file under a random name
//! 3. Check the caller owns the video
//! 4. Promote the staged file to durable storage
//! 5. Point the video record at the promoted asset
//! 6. Remove the staged file
//!
//! Stages run strictly in that order. The record is only written after the durable
//! object exists, and the staged file is removed whatever the outcome, including when
//! the pipeline future is dropped halfway.

mod cleanup;
mod error;
mod metadata;
mod ownership;
mod staging;
pub mod store;
pub mod validator;

use std::fmt::Display;
use std::sync::Arc;

use axum::body::Bytes;
use backend_storage::video::{VideoRecord, VideoRecordStore};
use futures::Stream;
use tracing::{info, instrument, warn};

pub use cleanup::StagedAsset;
pub use error::{UploadError, UploadResult};
pub use staging::{random_token, StagingWriter};
pub use store::{AssetStore, LocalAssetStore, S3AssetStore, StoreError};
pub use validator::{AssetKind, ValidatedPayload};

/// Untrusted upload body plus what the client claims about it
pub struct RawPayload<S> {
    /// Size the client declared for the file, if any
    pub declared_size: Option<u64>,
    /// Media type the client declared for the file
    pub media_type: Option<String>,
    /// The bytes
    pub body: S,
}

/// Input to the upload pipeline
pub struct UploadRequest<S> {
    /// Target video
    pub video_id: String,
    /// Verified identity of the caller
    pub caller_id: String,
    /// Which asset is being replaced
    pub kind: AssetKind,
    /// The file, `None` if the request carried none
    pub payload: Option<RawPayload<S>>,
}

/// Runs uploads from request body to updated video record
pub struct AssetPipeline {
    records: Arc<dyn VideoRecordStore>,
    staging: StagingWriter,
    thumbnail_store: Arc<dyn AssetStore>,
    video_store: Arc<dyn AssetStore>,
}

impl AssetPipeline {
    /// Creates a pipeline
    ///
    /// # Arguments
    ///
    /// * `records` - Video record store
    /// * `staging` - Writer for the local staging area
    /// * `thumbnail_store` - Destination for thumbnails (the served asset root)
    /// * `video_store` - Destination for videos (object storage)
    #[must_use]
    pub fn new(
        records: Arc<dyn VideoRecordStore>,
        staging: StagingWriter,
        thumbnail_store: Arc<dyn AssetStore>,
        video_store: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            records,
            staging,
            thumbnail_store,
            video_store,
        }
    }

    fn store_for(&self, kind: AssetKind) -> &dyn AssetStore {
        match kind {
            AssetKind::Thumbnail => self.thumbnail_store.as_ref(),
            AssetKind::Video => self.video_store.as_ref(),
        }
    }

    /// Runs one upload and returns the updated record
    ///
    /// # Errors
    ///
    /// Returns the `UploadError` of the first stage that failed. Client errors
    /// (`MissingPayload`, `PayloadTooLarge`, `UnsupportedMediaType`,
    /// `RecordNotFound`, `Forbidden`) leave no durable object and no record change.
    #[instrument(skip_all, fields(video_id = %request.video_id, kind = %request.kind))]
    pub async fn run<S, E>(&self, request: UploadRequest<S>) -> UploadResult<VideoRecord>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let UploadRequest {
            video_id,
            caller_id,
            kind,
            payload,
        } = request;

        let payload = payload.ok_or(UploadError::MissingPayload)?;
        let validated =
            validator::validate(kind, payload.declared_size, payload.media_type.as_deref())?;

        let staged = self.staging.stage(&validated, payload.body).await?;

        let outcome = self.promote(&video_id, &caller_id, kind, &staged).await;
        staged.discard().await;

        match &outcome {
            Ok(_) => info!("upload complete"),
            Err(e) if e.is_client_error() => warn!(error = %e, "upload rejected"),
            Err(e) => tracing::error!(error = %e, "upload failed"),
        }

        outcome
    }

    async fn promote(
        &self,
        video_id: &str,
        caller_id: &str,
        kind: AssetKind,
        staged: &StagedAsset,
    ) -> UploadResult<VideoRecord> {
        ownership::authorize(self.records.as_ref(), video_id, caller_id).await?;

        let reference = self
            .store_for(kind)
            .put(staged.file_name(), staged.path(), staged.media_type())
            .await
            .map_err(|e| UploadError::PromotionError(e.to_string()))?;

        metadata::point_at(self.records.as_ref(), video_id, kind, &reference).await
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use backend_storage::InMemoryVideoStorage;
    use futures::{stream, StreamExt};
    use tempfile::TempDir;

    use super::store::StoreResult;
    use super::*;

    const OWNER: &str = "owner-1";
    const VIDEO_ID: &str = "video-1";

    /// Object store that keeps promoted bytes in memory
    #[derive(Default)]
    struct RecordingStore {
        objects: std::sync::Mutex<Vec<(String, Vec<u8>, String)>>,
        fail: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn count(&self) -> usize {
            self.objects.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AssetStore for RecordingStore {
        async fn put(&self, key: &str, source: &Path, content_type: &str) -> StoreResult<String> {
            if self.fail {
                return Err(StoreError::UpstreamError("bucket unavailable".to_string()));
            }
            let bytes = tokio::fs::read(source).await?;
            self.objects
                .lock()
                .unwrap()
                .push((key.to_string(), bytes, content_type.to_string()));
            Ok(format!("https://bucket.s3.us-east-1.amazonaws.com/{key}"))
        }
    }

    /// Body stream that counts how many chunks were pulled from it
    fn counted_body(
        data: Vec<u8>,
        pulled: Arc<AtomicUsize>,
    ) -> impl Stream<Item = Result<Bytes, Infallible>> {
        stream::iter(vec![data]).map(move |chunk| {
            pulled.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from(chunk))
        })
    }

    struct Fixture {
        staging_dir: TempDir,
        records: Arc<InMemoryVideoStorage>,
        thumbnails: Arc<RecordingStore>,
        videos: Arc<RecordingStore>,
        pipeline: AssetPipeline,
    }

    impl Fixture {
        async fn new() -> Self {
            Self::with_stores(RecordingStore::default(), RecordingStore::default()).await
        }

        async fn with_stores(thumbnails: RecordingStore, videos: RecordingStore) -> Self {
            let staging_dir = tempfile::tempdir().unwrap();
            let records = Arc::new(InMemoryVideoStorage::new());
            records.insert(video_record()).await;
            let thumbnails = Arc::new(thumbnails);
            let videos = Arc::new(videos);

            let pipeline = AssetPipeline::new(
                records.clone(),
                StagingWriter::new(staging_dir.path()),
                thumbnails.clone(),
                videos.clone(),
            );

            Self {
                staging_dir,
                records,
                thumbnails,
                videos,
                pipeline,
            }
        }

        fn staged_files(&self) -> usize {
            std::fs::read_dir(self.staging_dir.path()).unwrap().count()
        }

        async fn record(&self) -> VideoRecord {
            self.records.get(VIDEO_ID).await.unwrap().unwrap()
        }
    }

    fn video_record() -> VideoRecord {
        VideoRecord {
            id: VIDEO_ID.to_string(),
            user_id: OWNER.to_string(),
            title: "Boots".to_string(),
            description: "a video".to_string(),
            created_at: 1_700_000_000,
            updated_at: 0,
            thumbnail_url: None,
            video_url: None,
        }
    }

    fn request(
        kind: AssetKind,
        caller: &str,
        media_type: &str,
        data: Vec<u8>,
    ) -> UploadRequest<impl Stream<Item = Result<Bytes, Infallible>>> {
        UploadRequest {
            video_id: VIDEO_ID.to_string(),
            caller_id: caller.to_string(),
            kind,
            payload: Some(RawPayload {
                declared_size: Some(data.len() as u64),
                media_type: Some(media_type.to_string()),
                body: stream::iter(vec![Ok(Bytes::from(data))]),
            }),
        }
    }

    #[tokio::test]
    async fn test_thumbnail_upload_by_owner_points_record_at_png() {
        let fixture = Fixture::new().await;
        let data = vec![7u8; 2 << 20];

        let updated = fixture
            .pipeline
            .run(request(AssetKind::Thumbnail, OWNER, "image/png", data.clone()))
            .await
            .unwrap();

        let url = updated.thumbnail_url.clone().unwrap();
        assert!(url.ends_with(".png"));
        assert_eq!(fixture.record().await, updated);

        // Only the thumbnail reference changed
        let mut expected = video_record();
        expected.thumbnail_url = Some(url.clone());
        expected.updated_at = updated.updated_at;
        assert_eq!(updated, expected);

        let objects = fixture.thumbnails.objects.lock().unwrap();
        assert_eq!(objects.len(), 1);
        let (key, bytes, content_type) = &objects[0];
        assert!(url.ends_with(key.as_str()));
        assert_eq!(bytes, &data);
        assert_eq!(content_type, "image/png");
        assert_eq!(fixture.videos.count(), 0);
        assert_eq!(fixture.staged_files(), 0);
    }

    #[tokio::test]
    async fn test_video_upload_goes_to_video_store() {
        let fixture = Fixture::new().await;

        let updated = fixture
            .pipeline
            .run(request(AssetKind::Video, OWNER, "video/mp4", b"mp4".to_vec()))
            .await
            .unwrap();

        let url = updated.video_url.unwrap();
        assert!(url.starts_with("https://bucket.s3.us-east-1.amazonaws.com/"));
        assert!(url.ends_with(".mp4"));
        assert_eq!(updated.thumbnail_url, None);
        assert_eq!(fixture.videos.count(), 1);
        assert_eq!(fixture.thumbnails.count(), 0);
        assert_eq!(fixture.staged_files(), 0);
    }

    #[tokio::test]
    async fn test_oversized_video_fails_before_reading_body() {
        let fixture = Fixture::new().await;
        let pulled = Arc::new(AtomicUsize::new(0));
        let upload = UploadRequest {
            video_id: VIDEO_ID.to_string(),
            caller_id: OWNER.to_string(),
            kind: AssetKind::Video,
            payload: Some(RawPayload {
                declared_size: Some(3 << 29),
                media_type: Some("video/mp4".to_string()),
                body: counted_body(b"never read".to_vec(), pulled.clone()),
            }),
        };

        let result = fixture.pipeline.run(upload).await;

        assert!(matches!(result, Err(UploadError::PayloadTooLarge { .. })));
        assert_eq!(pulled.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.staged_files(), 0);
        assert_eq!(fixture.videos.count(), 0);
        assert_eq!(fixture.records.update_count(), 0);
    }

    #[tokio::test]
    async fn test_gif_thumbnail_is_rejected_before_staging() {
        let fixture = Fixture::new().await;

        let result = fixture
            .pipeline
            .run(request(AssetKind::Thumbnail, OWNER, "image/gif", b"GIF89a".to_vec()))
            .await;

        assert!(matches!(result, Err(UploadError::UnsupportedMediaType(t)) if t == "image/gif"));
        assert_eq!(fixture.staged_files(), 0);
        assert_eq!(fixture.thumbnails.count(), 0);
        assert_eq!(fixture.records.update_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_payload() {
        let fixture = Fixture::new().await;
        let upload: UploadRequest<stream::Empty<Result<Bytes, Infallible>>> = UploadRequest {
            video_id: VIDEO_ID.to_string(),
            caller_id: OWNER.to_string(),
            kind: AssetKind::Thumbnail,
            payload: None,
        };

        let result = fixture.pipeline.run(upload).await;

        assert!(matches!(result, Err(UploadError::MissingPayload)));
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden_and_nothing_is_promoted() {
        let fixture = Fixture::new().await;

        let result = fixture
            .pipeline
            .run(request(AssetKind::Thumbnail, "intruder", "image/png", vec![1, 2, 3]))
            .await;

        assert!(matches!(result, Err(UploadError::Forbidden)));
        assert_eq!(fixture.thumbnails.count(), 0);
        assert_eq!(fixture.records.update_count(), 0);
        assert_eq!(fixture.record().await, video_record());
        assert_eq!(fixture.staged_files(), 0);
    }

    #[tokio::test]
    async fn test_unknown_video_is_not_found() {
        let fixture = Fixture::new().await;
        let mut upload = request(AssetKind::Thumbnail, OWNER, "image/jpeg", vec![0xff, 0xd8]);
        upload.video_id = "missing".to_string();

        let result = fixture.pipeline.run(upload).await;

        assert!(matches!(result, Err(UploadError::RecordNotFound(id)) if id == "missing"));
        assert_eq!(fixture.thumbnails.count(), 0);
        assert_eq!(fixture.staged_files(), 0);
    }

    #[tokio::test]
    async fn test_promotion_failure_leaves_record_untouched() {
        let fixture =
            Fixture::with_stores(RecordingStore::default(), RecordingStore::failing()).await;

        let result = fixture
            .pipeline
            .run(request(AssetKind::Video, OWNER, "video/mp4", b"mp4".to_vec()))
            .await;

        assert!(matches!(result, Err(UploadError::PromotionError(_))));
        assert_eq!(fixture.records.update_count(), 0);
        assert_eq!(fixture.record().await, video_record());
        assert_eq!(fixture.staged_files(), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_after_promotion() {
        let fixture = Fixture::new().await;
        fixture.records.set_unavailable(true);

        let result = fixture
            .pipeline
            .run(request(AssetKind::Thumbnail, OWNER, "image/png", vec![1]))
            .await;

        assert!(matches!(result, Err(UploadError::PersistenceError(_))));
        // The promoted object stays behind; the record never points at it
        assert_eq!(fixture.thumbnails.count(), 1);
        assert_eq!(fixture.record().await, video_record());
        assert_eq!(fixture.staged_files(), 0);
    }

    #[tokio::test]
    async fn test_reupload_produces_new_key() {
        let fixture = Fixture::new().await;

        let first = fixture
            .pipeline
            .run(request(AssetKind::Thumbnail, OWNER, "image/png", vec![1]))
            .await
            .unwrap();
        let second = fixture
            .pipeline
            .run(request(AssetKind::Thumbnail, OWNER, "image/png", vec![2]))
            .await
            .unwrap();

        assert_ne!(first.thumbnail_url, second.thumbnail_url);
        assert_eq!(fixture.record().await.thumbnail_url, second.thumbnail_url);
        assert_eq!(fixture.thumbnails.count(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_upload_removes_staged_file() {
        let fixture = Fixture::new().await;
        // A body that yields one chunk and then never finishes
        let body = stream::iter(vec![Ok::<_, Infallible>(Bytes::from_static(b"partial"))])
            .chain(stream::pending());
        let upload = UploadRequest {
            video_id: VIDEO_ID.to_string(),
            caller_id: OWNER.to_string(),
            kind: AssetKind::Video,
            payload: Some(RawPayload {
                declared_size: None,
                media_type: Some("video/mp4".to_string()),
                body,
            }),
        };

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            fixture.pipeline.run(upload),
        )
        .await;

        assert!(timed_out.is_err());
        assert_eq!(fixture.staged_files(), 0);
        assert_eq!(fixture.videos.count(), 0);
        assert_eq!(fixture.records.update_count(), 0);
    }
}
