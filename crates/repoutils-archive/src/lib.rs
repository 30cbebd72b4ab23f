//! The archive fetch backend (spec §4.5.2): download to a temporary file,
//! extract by `archive-type`, and fold a detected single root directory up
//! into the destination.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod extract;

pub use client::HttpClient;
pub use error::{ArchiveError, Result};
pub use extract::{ArchiveType, ExtractionResult, Extractor};

use std::path::Path;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Asked when the destination already exists before extraction. The
/// scheduler wires this to a UCI prompt; the default always declines so a
/// headless run never clobbers data silently.
#[async_trait::async_trait]
pub trait OverwritePolicy: Send + Sync {
    /// Return `true` to remove `path` and proceed, `false` to abort.
    async fn confirm_overwrite(&self, path: &Path) -> bool;
}

/// Never overwrites; used when no interactive policy is supplied.
pub struct DenyOverwrite;

#[async_trait::async_trait]
impl OverwritePolicy for DenyOverwrite {
    async fn confirm_overwrite(&self, _path: &Path) -> bool {
        false
    }
}

/// Downloads an archive over HTTP and extracts it into place.
#[derive(Clone)]
pub struct ArchiveBackend {
    client: HttpClient,
    extractor: Extractor,
}

impl ArchiveBackend {
    /// Build a backend with a fresh HTTP client.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: HttpClient::new()?,
            extractor: Extractor,
        })
    }

    /// Fetch `url` (an archive of `archive_type`) into `dest`. If `dest`
    /// already exists, `overwrite` is consulted before it is removed.
    pub async fn fetch(
        &self,
        url: &str,
        archive_type: ArchiveType,
        dest: &Path,
        overwrite: &dyn OverwritePolicy,
    ) -> Result<()> {
        if dest.exists() {
            if !overwrite.confirm_overwrite(dest).await {
                return Err(ArchiveError::OverwriteDeclined {
                    path: dest.to_path_buf(),
                });
            }
            tokio::fs::remove_dir_all(dest)
                .await
                .map_err(|e| ArchiveError::io(dest, e))?;
        }

        let staging_dir = tempfile::tempdir().map_err(|e| ArchiveError::io(dest, e))?;
        let archive_path = staging_dir.path().join("archive");

        debug!(url, dest = %dest.display(), "downloading archive");
        self.download_to(url, &archive_path).await?;

        let result = self
            .extractor
            .extract(&archive_path, archive_type, dest)
            .await;

        if result.is_err() {
            warn!(url, dest = %dest.display(), "archive fetch failed, cleaning up");
        }

        result.map(|_| ())
    }

    async fn download_to(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self.client.get(url).await?;
        let mut stream = response.bytes_stream();
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| ArchiveError::io(dest, e))?;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ArchiveError::from_reqwest(&e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| ArchiveError::io(dest, e))?;
        }
        file.flush().await.map_err(|e| ArchiveError::io(dest, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deny_overwrite_always_declines() {
        assert!(!DenyOverwrite.confirm_overwrite(Path::new("/tmp/x")).await);
    }

    #[test]
    fn backend_builds() {
        assert!(ArchiveBackend::new().is_ok());
    }
}
