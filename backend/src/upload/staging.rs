//! Writes validated payloads to the local staging area

use std::fmt::Display;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use futures::{pin_mut, Stream, StreamExt};
use rand::{rngs::OsRng, RngCore};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, instrument};

use super::{StagedAsset, UploadError, UploadResult, ValidatedPayload};

/// Number of random bytes in a staged file name
pub const STAGING_TOKEN_BYTES: usize = 32;

/// Generates a URL-safe random file stem from the OS CSPRNG
#[must_use]
pub fn random_token() -> String {
    let mut token = [0u8; STAGING_TOKEN_BYTES];
    OsRng.fill_bytes(&mut token);
    URL_SAFE_NO_PAD.encode(token)
}

/// Writes upload bodies to ephemeral local files
#[derive(Debug, Clone)]
pub struct StagingWriter {
    dir: PathBuf,
}

impl StagingWriter {
    /// Creates a writer staging into `dir`
    ///
    /// The directory is created on first use.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Staging directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Streams `body` into a new staged file
    ///
    /// The file is named `<random token>.<subtype>`. The running byte count is
    /// checked against the payload ceiling while streaming, so a body larger than
    /// its declared size still fails with `PayloadTooLarge`. Any partially written
    /// file is removed before an error is returned.
    ///
    /// # Errors
    ///
    /// * `UploadError::PayloadTooLarge` - body grew past the ceiling
    /// * `UploadError::StagingWriteError` - directory, file or body stream failure
    #[instrument(skip_all, fields(kind = %payload.kind(), declared_size = ?payload.declared_size()))]
    pub async fn stage<S, E>(&self, payload: &ValidatedPayload, body: S) -> UploadResult<StagedAsset>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            UploadError::StagingWriteError(format!(
                "failed to create staging directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let file_name = format!("{}.{}", random_token(), payload.extension());
        let mut staged = StagedAsset::new(
            self.dir.join(&file_name),
            file_name,
            payload.content_type().to_string(),
        );

        let written = write_body(staged.path(), body, payload.limit()).await;
        match written {
            Ok(size) => {
                staged.set_size(size);
                debug!(
                    path = %staged.path().display(),
                    size_bytes = size,
                    "payload staged"
                );
                Ok(staged)
            }
            Err(e) => {
                staged.discard().await;
                Err(e)
            }
        }
    }
}

async fn write_body<S, E>(path: &Path, body: S, limit: u64) -> UploadResult<u64>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let write_error = |e: std::io::Error| {
        UploadError::StagingWriteError(format!("failed to write {}: {e}", path.display()))
    };

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(write_error)?;

    pin_mut!(body);
    let mut written: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| {
            UploadError::StagingWriteError(format!("failed to read upload body: {e}"))
        })?;

        written += chunk.len() as u64;
        if written > limit {
            return Err(UploadError::PayloadTooLarge { limit });
        }

        file.write_all(&chunk).await.map_err(write_error)?;
    }

    file.flush().await.map_err(write_error)?;
    file.sync_all().await.map_err(write_error)?;

    Ok(written)
}
