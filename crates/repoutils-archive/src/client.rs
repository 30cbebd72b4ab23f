//! HTTP client for archive downloads: connection pooling, HTTP/2
//! multiplexing, and environment-proxy support.

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, USER_AGENT},
    Client, Response, StatusCode,
};
use tracing::{debug, trace};

use crate::error::{ArchiveError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT_VALUE: &str = concat!("repoutils/", env!("CARGO_PKG_VERSION"));

/// A pooled HTTP client used by the archive backend to probe mirrors and
/// download archives.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Build a client with pooling, gzip/brotli/zstd transparent decoding,
    /// and environment proxy settings (`HTTPS_PROXY`/`HTTP_PROXY`/`NO_PROXY`).
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .tcp_nodelay(true)
            .gzip(true)
            .brotli(true)
            .zstd(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .use_rustls_tls()
            .proxy(reqwest::Proxy::custom(system_proxy_for))
            .build()
            .map_err(|e| ArchiveError::Extract(e.to_string()))?;

        Ok(Self { client })
    }

    /// The underlying reqwest client, for callers (like the mirror
    /// resolver) that need raw access.
    #[must_use]
    pub const fn inner(&self) -> &Client {
        &self.client
    }

    /// `GET url`, checking the response status before returning it.
    pub async fn get(&self, url: &str) -> Result<Response> {
        debug!(url, "GET request");
        let response = self
            .client
            .get(url)
            .headers(default_headers())
            .send()
            .await
            .map_err(|e| ArchiveError::from_reqwest(&e))?;
        self.check_response(response).await
    }

    /// `HEAD url`, checking the response status before returning it.
    pub async fn head(&self, url: &str) -> Result<Response> {
        trace!(url, "HEAD request");
        let response = self
            .client
            .head(url)
            .headers(default_headers())
            .send()
            .await
            .map_err(|e| ArchiveError::from_reqwest(&e))?;
        self.check_response(response).await
    }

    async fn check_response(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() || status == StatusCode::PARTIAL_CONTENT {
            return Ok(response);
        }

        let url = response.url().to_string();
        match status {
            StatusCode::NOT_FOUND => Err(ArchiveError::NotFound { url }),
            _ if status.is_server_error() => Err(ArchiveError::Network {
                message: format!("server error {status}"),
                status_code: Some(status.as_u16()),
                retryable: true,
            }),
            _ => Err(ArchiveError::Network {
                message: format!("HTTP {status}"),
                status_code: Some(status.as_u16()),
                retryable: false,
            }),
        }
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(ua) = HeaderValue::from_str(USER_AGENT_VALUE) {
        headers.insert(USER_AGENT, ua);
    }
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, br, zstd"));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers
}

fn system_proxy_for(url: &reqwest::Url) -> Option<reqwest::Url> {
    let scheme = url.scheme();
    let host = url.host_str().unwrap_or("");

    if let Ok(no_proxy) = std::env::var("NO_PROXY").or_else(|_| std::env::var("no_proxy")) {
        for pattern in no_proxy.split(',') {
            let pattern = pattern.trim();
            if pattern == "*" || (!pattern.is_empty() && (host.ends_with(pattern) || host == pattern)) {
                return None;
            }
        }
    }

    let proxy_var = if scheme == "https" {
        std::env::var("HTTPS_PROXY")
            .or_else(|_| std::env::var("https_proxy"))
            .or_else(|_| std::env::var("HTTP_PROXY"))
            .or_else(|_| std::env::var("http_proxy"))
    } else {
        std::env::var("HTTP_PROXY").or_else(|_| std::env::var("http_proxy"))
    };

    proxy_var.ok().and_then(|p| p.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn client_builds_with_defaults() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn client_debug_does_not_panic() {
        let client = HttpClient::new().unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("HttpClient"));
    }
}
