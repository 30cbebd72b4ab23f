//! HTTP mock server utilities for testing mirror resolution and archive
//! downloads.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mock mirror endpoint, standing in for one entry of a mirrorlist's
/// `host.protocol.mirror-name` URL template once resolved to a concrete
/// path, used to race mirror resolution against (spec §4.4).
#[derive(Debug)]
pub struct MockMirror {
    server: MockServer,
}

impl MockMirror {
    /// Start a new mock mirror server.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// The base URL of this mirror.
    #[must_use]
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Respond with `status` after `delay_ms`, so speedtest races between
    /// several `MockMirror`s have a deterministic winner.
    pub async fn respond_after(&self, path_str: &str, status: u16, delay_ms: u64) {
        Mock::given(method("GET"))
            .and(path(path_str))
            .respond_with(ResponseTemplate::new(status).set_delay(std::time::Duration::from_millis(delay_ms)))
            .mount(&self.server)
            .await;
    }

    /// Respond immediately with `status` and no delay.
    pub async fn respond(&self, path_str: &str, status: u16) {
        self.respond_after(path_str, status, 0).await;
    }

    /// Leave `path_str` entirely unmounted; wiremock answers 404 to any
    /// unmatched request, which the mirror resolver treats as unreachable.
    pub fn unreachable(&self) {}
}

/// Mock archive download server for testing the archive backend (spec
/// §4.5).
#[derive(Debug)]
pub struct MockArchiveServer {
    server: MockServer,
}

impl MockArchiveServer {
    /// Start a new mock archive server.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// The base URL of this server.
    #[must_use]
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Register a downloadable archive at `path_str`.
    pub async fn register_archive(&self, path_str: &str, content: &[u8], content_type: &str) {
        Mock::given(method("GET"))
            .and(path(path_str))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(content.to_vec())
                    .insert_header("Content-Type", content_type)
                    .insert_header("Content-Length", content.len().to_string()),
            )
            .mount(&self.server)
            .await;
    }

    /// Register a slow response, for timeout/cancellation testing.
    pub async fn register_slow(&self, path_str: &str, delay_ms: u64) {
        Mock::given(method("GET"))
            .and(path(path_str))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![0u8; 100])
                    .set_delay(std::time::Duration::from_millis(delay_ms)),
            )
            .mount(&self.server)
            .await;
    }

    /// Register an error response.
    pub async fn register_error(&self, path_str: &str, status: u16, message: &str) {
        Mock::given(method("GET"))
            .and(path(path_str))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": message })))
            .mount(&self.server)
            .await;
    }

    /// Register a redirect.
    pub async fn register_redirect(&self, from: &str, to: &str) {
        Mock::given(method("GET"))
            .and(path(from))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", to))
            .mount(&self.server)
            .await;
    }

    /// Received request count, for asserting exactly one mirror was used.
    pub async fn received_requests(&self) -> usize {
        self.server.received_requests().await.unwrap_or_default().len()
    }
}

/// Create a minimal valid ZIP file (empty archive), for error-path tests
/// that don't need real entries.
#[must_use]
pub fn create_minimal_zip() -> Vec<u8> {
    vec![
        0x50, 0x4B, 0x05, 0x06, // End of central directory signature
        0x00, 0x00, // Number of this disk
        0x00, 0x00, // Disk with central directory
        0x00, 0x00, // Number of entries on this disk
        0x00, 0x00, // Total number of entries
        0x00, 0x00, 0x00, 0x00, // Size of central directory
        0x00, 0x00, 0x00, 0x00, // Offset to central directory
        0x00, 0x00, // Comment length
    ]
}

/// Build a single-entry ZIP archive in memory, matching the format
/// `repoutils_archive`'s extractor reads.
pub async fn create_zip_with_file(filename: &str, content: &[u8]) -> anyhow::Result<Vec<u8>> {
    use async_zip::base::write::ZipFileWriter;
    use async_zip::{Compression, ZipEntryBuilder};

    let tmp = tempfile::NamedTempFile::new()?;
    let file = tokio::fs::File::create(tmp.path()).await?;
    let mut writer = ZipFileWriter::with_tokio(file);
    let entry = ZipEntryBuilder::new(filename.to_string(), Compression::Deflate);
    writer.write_entry_whole(entry, content).await?;
    writer.close().await?;

    Ok(tokio::fs::read(tmp.path()).await?)
}

/// Build a single-entry gzip-compressed tarball in memory, matching the
/// `tar.gz` format `repoutils_archive`'s extractor reads.
pub async fn create_tar_gz_with_file(filename: &str, content: &[u8]) -> anyhow::Result<Vec<u8>> {
    use async_compression::tokio::write::GzipEncoder;
    use tokio::io::AsyncWriteExt;
    use tokio_tar::{Builder, Header};

    let tmp = tempfile::NamedTempFile::new()?;
    let file = tokio::fs::File::create(tmp.path()).await?;
    let encoder = GzipEncoder::new(file);
    let mut builder = Builder::new(encoder);

    let mut header = Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, filename, content).await?;
    builder.finish().await?;

    let mut encoder = builder.into_inner().await?;
    encoder.shutdown().await?;

    Ok(tokio::fs::read(tmp.path()).await?)
}
