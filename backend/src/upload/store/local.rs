//! Asset store backed by the locally served asset root

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{info, warn};

use super::{check_key, AssetStore, StoreResult};

/// Path prefix under which the asset root is served
pub const ASSETS_ROUTE: &str = "/assets";

/// Local filesystem store whose files are served over HTTP
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalAssetStore {
    /// Creates a store writing into `root`
    ///
    /// # Arguments
    ///
    /// * `root` - Directory served under `/assets`
    /// * `public_base_url` - Externally reachable origin of this service, e.g. `https://tubely.example.com`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Directory the assets are written to
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute URL an asset stored under `key` is served from
    #[must_use]
    pub fn url_for(&self, key: &str) -> String {
        format!("{}{ASSETS_ROUTE}/{key}", self.public_base_url)
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn put(&self, key: &str, source: &Path, _content_type: &str) -> StoreResult<String> {
        check_key(key)?;
        fs::create_dir_all(&self.root).await?;

        // Copy under a hidden name first so the final name only ever holds complete files.
        // The copy runs to completion on the blocking pool even if this future is dropped.
        let partial = self.root.join(format!(".{key}.part"));
        let target = self.root.join(key);

        let size = {
            let source = source.to_path_buf();
            let target = target.clone();
            tokio::task::spawn_blocking(move || copy_into_place(&source, partial, &target))
                .await
                .map_err(io::Error::other)??
        };

        info!(
            path = %target.display(),
            key = %key,
            size_bytes = size,
            "local asset stored"
        );

        Ok(self.url_for(key))
    }
}

/// Hidden copy in the asset root, removed on drop unless committed
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    const fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Renames the copy to `target` and disarms the guard
    fn commit(mut self, target: &Path) -> io::Result<()> {
        std::fs::rename(&self.path, target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove partial asset"
            ),
        }
    }
}

fn copy_into_place(source: &Path, partial: PathBuf, target: &Path) -> io::Result<u64> {
    let partial = PartialFile::new(partial);
    let size = std::fs::copy(source, partial.path())?;
    std::fs::File::open(partial.path())?.sync_all()?;
    partial.commit(target)?;
    Ok(size)
}
