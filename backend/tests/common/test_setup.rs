use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use backend::{
    jwt::JwtVerifier,
    server,
    types::Environment,
    upload::{
        store::StoreResult, AssetPipeline, AssetStore, LocalAssetStore, StagingWriter, StoreError,
    },
};
use backend_storage::{
    video::{VideoRecord, VideoRecordStore},
    InMemoryVideoStorage,
};
use tempfile::TempDir;
use tower::ServiceExt;

use super::utils::{multipart_body, BOUNDARY};

pub const JWT_SECRET: &str = "test-secret";
pub const OWNER_ID: &str = "owner-1";
pub const PUBLIC_BASE_URL: &str = "https://tubely.test";
pub const VIDEO_BASE_URL: &str = "https://videos.test";

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Video store that always fails, standing in for an unreachable bucket
pub struct UnavailableStore;

#[async_trait]
impl AssetStore for UnavailableStore {
    async fn put(&self, _key: &str, _source: &Path, _content_type: &str) -> StoreResult<String> {
        Err(StoreError::UpstreamError("bucket unavailable".to_string()))
    }
}

/// Router wired to in-memory records and temporary directories
pub struct TestContext {
    pub router: Router,
    pub records: Arc<InMemoryVideoStorage>,
    pub verifier: Arc<JwtVerifier>,
    pub video_id: String,
    pub staging_dir: TempDir,
    pub asset_root: TempDir,
    pub video_root: TempDir,
}

impl TestContext {
    /// Videos are promoted to a local directory served under [`VIDEO_BASE_URL`]
    pub async fn new() -> Self {
        let video_root = TempDir::new().unwrap();
        let video_store = Arc::new(LocalAssetStore::new(video_root.path(), VIDEO_BASE_URL));
        Self::with_video_store(video_root, video_store).await
    }

    /// Video promotion always fails
    pub async fn with_unavailable_video_store() -> Self {
        Self::with_video_store(TempDir::new().unwrap(), Arc::new(UnavailableStore)).await
    }

    async fn with_video_store(video_root: TempDir, video_store: Arc<dyn AssetStore>) -> Self {
        setup_test_env();

        let staging_dir = TempDir::new().unwrap();
        let asset_root = TempDir::new().unwrap();

        let records = Arc::new(InMemoryVideoStorage::new());
        let video_id = uuid::Uuid::new_v4().to_string();
        records
            .insert(VideoRecord {
                id: video_id.clone(),
                user_id: OWNER_ID.to_string(),
                title: "Boots and cats".to_string(),
                description: "A test video".to_string(),
                created_at: 1_700_000_000,
                updated_at: 0,
                thumbnail_url: None,
                video_url: None,
            })
            .await;

        let thumbnail_store = Arc::new(LocalAssetStore::new(asset_root.path(), PUBLIC_BASE_URL));
        let pipeline = Arc::new(AssetPipeline::new(
            records.clone(),
            StagingWriter::new(staging_dir.path()),
            thumbnail_store,
            video_store,
        ));
        let verifier = Arc::new(JwtVerifier::new(JWT_SECRET));

        let router = server::router(
            Environment::Development,
            pipeline,
            verifier.clone(),
            asset_root.path().to_path_buf(),
        );

        Self {
            router,
            records,
            verifier,
            video_id,
            staging_dir,
            asset_root,
            video_root,
        }
    }

    pub fn token_for(&self, user_id: &str) -> String {
        self.verifier
            .issue(user_id, Duration::from_secs(3600))
            .unwrap()
    }

    /// Current state of the seeded record
    pub async fn record(&self) -> VideoRecord {
        self.records.get(&self.video_id).await.unwrap().unwrap()
    }

    /// Number of files left in the staging directory
    pub fn staged_file_count(&self) -> usize {
        std::fs::read_dir(self.staging_dir.path())
            .map(Iterator::count)
            .unwrap_or(0)
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Uploads one file field as the given user
    pub async fn upload(
        &self,
        route: &str,
        token: Option<&str>,
        field: &str,
        content_type: &str,
        data: &[u8],
    ) -> Response {
        let body = multipart_body(field, content_type, data);
        let mut builder = Request::builder()
            .uri(route)
            .method("POST")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("Content-Length", body.len());

        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn upload_thumbnail(&self, user_id: &str, content_type: &str, data: &[u8]) -> Response {
        let token = self.token_for(user_id);
        self.upload(
            &format!("/api/thumbnail_upload/{}", self.video_id),
            Some(&token),
            "thumbnail",
            content_type,
            data,
        )
        .await
    }

    pub async fn upload_video(&self, user_id: &str, content_type: &str, data: &[u8]) -> Response {
        let token = self.token_for(user_id);
        self.upload(
            &format!("/api/video_upload/{}", self.video_id),
            Some(&token),
            "video",
            content_type,
            data,
        )
        .await
    }

    pub async fn send_get_request(&self, route: &str) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }
}
