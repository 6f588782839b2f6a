//! Staged file ownership and removal

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// A validated payload written to the staging area
///
/// The staged file lives exactly as long as this value. `discard` removes it once the
/// upload has reached a terminal state; if the value is dropped first (the request
/// future was cancelled, or a stage bailed out early) `Drop` removes it instead.
/// Removal failures are logged and never surface as upload errors.
#[derive(Debug)]
pub struct StagedAsset {
    path: PathBuf,
    file_name: String,
    media_type: String,
    size_bytes: u64,
    discarded: bool,
}

impl StagedAsset {
    pub(super) fn new(path: PathBuf, file_name: String, media_type: String) -> Self {
        Self {
            path,
            file_name,
            media_type,
            size_bytes: 0,
            discarded: false,
        }
    }

    pub(super) fn set_size(&mut self, size_bytes: u64) {
        self.size_bytes = size_bytes;
    }

    /// Location of the staged file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Random file name, reused as the permanent key
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Validated media type
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Number of bytes written
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Removes the staged file
    pub async fn discard(mut self) {
        self.discarded = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "staged file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove staged file"
            ),
        }
    }
}

impl Drop for StagedAsset {
    fn drop(&mut self) {
        if self.discarded {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "staged file removed on drop"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove staged file on drop"
            ),
        }
    }
}
