//! Streaming async archive extraction (spec §4.5.2): single-root-directory
//! detection and the zip/tar.* format family.

use std::path::{Path, PathBuf};

use async_compression::tokio::bufread::{BzDecoder, GzipDecoder, XzDecoder, ZstdDecoder};
use async_zip::base::read::seek::ZipFileReader;
use futures_util::TryStreamExt;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::BufReader;
use tokio_tar::Archive as TarArchive;
use tokio_util::compat::{TokioAsyncReadCompatExt, TokioAsyncWriteCompatExt};
use tracing::{debug, info, trace};

use crate::error::{ArchiveError, Result};

/// The archive format, selected by the subpackage's `archive-type` field
/// rather than sniffed from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    /// A plain ZIP file.
    Zip,
    /// Gzip-compressed tar.
    TarGz,
    /// Bzip2-compressed tar.
    TarBz2,
    /// Xz-compressed tar.
    TarXz,
    /// Zstd-compressed tar.
    TarZst,
    /// Uncompressed tar.
    Tar,
}

impl ArchiveType {
    /// Parse the `archive-type` field value.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            "tar.bz2" | "tbz2" => Ok(Self::TarBz2),
            "tar.xz" | "txz" => Ok(Self::TarXz),
            "tar.zst" | "tzst" => Ok(Self::TarZst),
            "tar" => Ok(Self::Tar),
            other => Err(ArchiveError::UnsupportedType(other.to_string())),
        }
    }
}

/// The outcome of extracting one archive.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Number of files extracted.
    pub files_extracted: usize,
    /// Total bytes written.
    pub total_size: u64,
    /// The single top-level directory, if the archive had exactly one.
    pub root_dir: Option<PathBuf>,
}

/// Extracts an archive into a staging directory, then folds a detected
/// single root directory up into the caller's real destination.
#[derive(Debug, Default, Clone, Copy)]
pub struct Extractor;

impl Extractor {
    /// Extract `archive` (of format `archive_type`) into `dest`, which must
    /// not yet exist. If the archive contains exactly one top-level
    /// directory, its contents become `dest`'s contents; otherwise `dest`
    /// holds the archive's full top level.
    pub async fn extract(
        &self,
        archive: &Path,
        archive_type: ArchiveType,
        dest: &Path,
    ) -> Result<ExtractionResult> {
        debug!(archive = %archive.display(), dest = %dest.display(), ?archive_type, "extracting archive");

        let staging_name = format!(
            "{}.repoutils-extract-tmp",
            dest.file_name().and_then(|n| n.to_str()).unwrap_or("archive")
        );
        let staging = dest
            .parent()
            .map(|p| p.join(&staging_name))
            .unwrap_or_else(|| PathBuf::from(&staging_name));
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .await
                .map_err(|e| ArchiveError::io(&staging, e))?;
        }
        fs::create_dir_all(&staging)
            .await
            .map_err(|e| ArchiveError::io(&staging, e))?;

        let result = match archive_type {
            ArchiveType::Zip => self.extract_zip(archive, &staging).await,
            ArchiveType::TarGz => self.extract_tar_gz(archive, &staging).await,
            ArchiveType::TarBz2 => self.extract_tar_bz2(archive, &staging).await,
            ArchiveType::TarXz => self.extract_tar_xz(archive, &staging).await,
            ArchiveType::TarZst => self.extract_tar_zst(archive, &staging).await,
            ArchiveType::Tar => self.extract_tar(archive, &staging).await,
        };

        let result = match result {
            Ok(r) => r,
            Err(err) => {
                let _ = fs::remove_dir_all(&staging).await;
                return Err(err);
            }
        };

        let promote_from = match &result.root_dir {
            Some(single_dir) => single_dir.clone(),
            None => staging.clone(),
        };

        if let Err(err) = fs::rename(&promote_from, dest).await {
            let _ = fs::remove_dir_all(&staging).await;
            return Err(ArchiveError::io(dest, err));
        }
        if promote_from != staging {
            let _ = fs::remove_dir_all(&staging).await;
        }

        info!(
            files = result.files_extracted,
            size = result.total_size,
            dest = %dest.display(),
            "extraction complete"
        );

        Ok(ExtractionResult {
            root_dir: Some(dest.to_path_buf()),
            ..result
        })
    }

    async fn extract_zip(&self, archive: &Path, dest: &Path) -> Result<ExtractionResult> {
        let file = File::open(archive)
            .await
            .map_err(|e| ArchiveError::io(archive, e))?;
        let reader = BufReader::new(file).compat();
        let mut zip = ZipFileReader::new(reader)
            .await
            .map_err(|e| ArchiveError::Extract(e.to_string()))?;

        let mut files_extracted = 0;
        let mut total_size = 0u64;
        let entry_count = zip.file().entries().len();

        for i in 0..entry_count {
            let entry = zip
                .file()
                .entries()
                .get(i)
                .ok_or_else(|| ArchiveError::Extract(format!("failed to get entry {i}")))?;
            let filename = entry
                .filename()
                .as_str()
                .map_err(|e| ArchiveError::Extract(format!("invalid filename: {e}")))?;

            let sanitized: PathBuf = filename
                .replace('\\', "/")
                .split('/')
                .filter(|s| !s.is_empty() && *s != "." && *s != "..")
                .collect();
            if sanitized.as_os_str().is_empty() {
                continue;
            }

            let out_path = dest.join(&sanitized);
            if !out_path.starts_with(dest) {
                return Err(ArchiveError::Extract(format!("path escape attempt: {filename}")));
            }

            let is_dir = entry.dir().map_err(|e| ArchiveError::Extract(e.to_string()))?;

            if is_dir {
                fs::create_dir_all(&out_path)
                    .await
                    .map_err(|e| ArchiveError::io(&out_path, e))?;
            } else {
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent)
                        .await
                        .map_err(|e| ArchiveError::io(parent, e))?;
                }
                let mut entry_reader = zip
                    .reader_without_entry(i)
                    .await
                    .map_err(|e| ArchiveError::Extract(e.to_string()))?;
                let writer = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&out_path)
                    .await
                    .map_err(|e| ArchiveError::io(&out_path, e))?;

                let size = futures_util::io::copy(&mut entry_reader, &mut writer.compat_write())
                    .await
                    .map_err(|e| ArchiveError::Extract(e.to_string()))?;

                total_size += size;
                files_extracted += 1;
                trace!(file = %out_path.display(), size, "extracted file");
            }
        }

        Ok(ExtractionResult {
            files_extracted,
            total_size,
            root_dir: find_root_dir(dest).await,
        })
    }

    async fn extract_tar_gz(&self, archive: &Path, dest: &Path) -> Result<ExtractionResult> {
        let file = File::open(archive).await.map_err(|e| ArchiveError::io(archive, e))?;
        self.extract_tar_reader(GzipDecoder::new(BufReader::new(file)), dest).await
    }

    async fn extract_tar_bz2(&self, archive: &Path, dest: &Path) -> Result<ExtractionResult> {
        let file = File::open(archive).await.map_err(|e| ArchiveError::io(archive, e))?;
        self.extract_tar_reader(BzDecoder::new(BufReader::new(file)), dest).await
    }

    async fn extract_tar_xz(&self, archive: &Path, dest: &Path) -> Result<ExtractionResult> {
        let file = File::open(archive).await.map_err(|e| ArchiveError::io(archive, e))?;
        self.extract_tar_reader(XzDecoder::new(BufReader::new(file)), dest).await
    }

    async fn extract_tar_zst(&self, archive: &Path, dest: &Path) -> Result<ExtractionResult> {
        let file = File::open(archive).await.map_err(|e| ArchiveError::io(archive, e))?;
        self.extract_tar_reader(ZstdDecoder::new(BufReader::new(file)), dest).await
    }

    async fn extract_tar(&self, archive: &Path, dest: &Path) -> Result<ExtractionResult> {
        let file = File::open(archive).await.map_err(|e| ArchiveError::io(archive, e))?;
        self.extract_tar_reader(BufReader::new(file), dest).await
    }

    async fn extract_tar_reader<R: tokio::io::AsyncRead + Unpin>(
        &self,
        reader: R,
        dest: &Path,
    ) -> Result<ExtractionResult> {
        let mut archive = TarArchive::new(reader);
        let mut entries = archive
            .entries()
            .map_err(|e| ArchiveError::Extract(e.to_string()))?;

        let mut files_extracted = 0;
        let mut total_size = 0u64;

        while let Some(mut entry) = entries
            .try_next()
            .await
            .map_err(|e| ArchiveError::Extract(e.to_string()))?
        {
            let path = entry.path().map_err(|e| ArchiveError::Extract(e.to_string()))?.to_path_buf();
            if path.as_os_str().is_empty() {
                continue;
            }

            let out_path = dest.join(&path);
            if !out_path.starts_with(dest) {
                return Err(ArchiveError::Extract(format!(
                    "path escape attempt: {}",
                    path.display()
                )));
            }

            let entry_type = entry.header().entry_type();
            if entry_type.is_dir() {
                fs::create_dir_all(&out_path)
                    .await
                    .map_err(|e| ArchiveError::io(&out_path, e))?;
            } else if entry_type.is_file() {
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent)
                        .await
                        .map_err(|e| ArchiveError::io(parent, e))?;
                }
                let size = entry.header().size().unwrap_or(0);
                entry
                    .unpack(&out_path)
                    .await
                    .map_err(|e| ArchiveError::Extract(e.to_string()))?;
                total_size += size;
                files_extracted += 1;
                trace!(file = %out_path.display(), size, "extracted file");
            }
        }

        Ok(ExtractionResult {
            files_extracted,
            total_size,
            root_dir: find_root_dir(dest).await,
        })
    }
}

/// `Some(dir)` iff `dest` contains exactly one entry and it is a directory.
async fn find_root_dir(dest: &Path) -> Option<PathBuf> {
    let mut read_dir = fs::read_dir(dest).await.ok()?;
    let mut entries = Vec::new();
    while let Ok(Some(entry)) = read_dir.next_entry().await {
        entries.push(entry);
        if entries.len() > 1 {
            return None;
        }
    }
    if entries.len() == 1 && entries[0].file_type().await.ok()?.is_dir() {
        Some(entries[0].path())
    } else {
        None
    }
}
