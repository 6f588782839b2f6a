//! Durable destinations for staged assets

mod error;
mod local;
mod s3;

use std::path::Path;

use async_trait::async_trait;

pub use error::{StoreError, StoreResult};
pub use local::{LocalAssetStore, ASSETS_ROUTE};
pub use s3::S3AssetStore;

/// A place staged bytes are promoted to
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Copies the file at `source` under `key` and returns its external reference
    ///
    /// The reference must only be returned once the object is durably stored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the object could not be written
    async fn put(&self, key: &str, source: &Path, content_type: &str) -> StoreResult<String>;
}

/// Rejects keys that are not a single plain file name
pub(crate) fn check_key(key: &str) -> StoreResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
