//! Error types for archive download and extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Archive backend error type.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Network/HTTP error while downloading.
    #[error("network error: {message}")]
    Network {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status_code: Option<u16>,
        /// Whether the error is retryable.
        retryable: bool,
    },

    /// Resource not found.
    #[error("not found: {url}")]
    NotFound {
        /// URL that was not found.
        url: String,
    },

    /// Archive decode/extraction error.
    #[error("archive error: {0}")]
    Extract(String),

    /// The `archive-type` value does not match a supported format.
    #[error("unsupported archive type: {0}")]
    UnsupportedType(String),

    /// A destination path already exists and the caller declined to
    /// overwrite it.
    #[error("destination already exists: {}", path.display())]
    OverwriteDeclined {
        /// Destination path.
        path: PathBuf,
    },

    /// I/O error with path context.
    #[error("io error at {}: {message}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl ArchiveError {
    /// Create a network error from a reqwest failure.
    #[must_use]
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            let code = status.as_u16();
            if code == 404 {
                return Self::NotFound {
                    url: err.url().map(ToString::to_string).unwrap_or_default(),
                };
            }
            return Self::Network {
                message: err.to_string(),
                status_code: Some(code),
                retryable: matches!(code, 408 | 429 | 500 | 502 | 503 | 504),
            };
        }
        Self::Network {
            message: err.to_string(),
            status_code: None,
            retryable: err.is_timeout() || err.is_connect(),
        }
    }

    /// Build an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error is worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { retryable: true, .. })
    }
}

impl From<ArchiveError> for repoutils_core::Error {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Network { message, .. } => repoutils_core::Error::network(message, None),
            ArchiveError::NotFound { url } => {
                repoutils_core::Error::network(format!("not found: {url}"), Some(url))
            }
            ArchiveError::Io { path, message } => {
                repoutils_core::Error::Os { path, message, hint: None }
            }
            other => repoutils_core::Error::validation(other.to_string(), None),
        }
    }
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
