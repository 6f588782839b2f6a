//! In-memory video record store for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::video::{
    AssetRef, VideoRecord, VideoRecordStore, VideoStorageError, VideoStorageResult,
};

/// Video record store kept in process memory
#[derive(Default)]
pub struct InMemoryVideoStorage {
    records: RwLock<HashMap<String, VideoRecord>>,
    unavailable: AtomicBool,
    updates: AtomicUsize,
}

impl InMemoryVideoStorage {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record without going through `set_asset_ref`
    pub async fn insert(&self, record: VideoRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    /// Makes every subsequent `set_asset_ref` fail with `Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful `set_asset_ref` calls so far
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoRecordStore for InMemoryVideoStorage {
    async fn get(&self, video_id: &str) -> VideoStorageResult<Option<VideoRecord>> {
        Ok(self.records.read().await.get(video_id).cloned())
    }

    async fn set_asset_ref(
        &self,
        video_id: &str,
        asset: AssetRef,
        reference: &str,
    ) -> VideoStorageResult<VideoRecord> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(VideoStorageError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }

        let mut records = self.records.write().await;
        let Some(existing) = records.get_mut(video_id) else {
            return Err(VideoStorageError::RecordMissing(video_id.to_string()));
        };
        match asset {
            AssetRef::Thumbnail => existing.thumbnail_url = Some(reference.to_string()),
            AssetRef::Video => existing.video_url = Some(reference.to_string()),
        }
        existing.updated_at = chrono::Utc::now().timestamp();
        self.updates.fetch_add(1, Ordering::SeqCst);

        Ok(existing.clone())
    }
}
