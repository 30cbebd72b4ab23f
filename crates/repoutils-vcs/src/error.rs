//! Error types for the git fetch backend.

use std::path::PathBuf;
use thiserror::Error;

/// Git backend error type.
#[derive(Error, Debug)]
pub enum VcsError {
    /// `destPath` is already a git working tree and `strict` was requested.
    #[error("already present: {path}")]
    AlreadyPresent {
        /// Destination path.
        path: PathBuf,
    },

    /// `git clone` exited non-zero.
    #[error("clone failed for {url}: {message}")]
    CloneFailed {
        /// Repository URL.
        url: String,
        /// Captured stderr (trimmed).
        message: String,
    },

    /// A pull-equivalent (`fetch` + `reset`) failed on an existing checkout.
    #[error("pull failed for {path}: {message}")]
    PullFailed {
        /// Repository path.
        path: PathBuf,
        /// Captured stderr (trimmed).
        message: String,
    },

    /// Adjusting remotes (origin/mirror/upstream) after a mirrored clone
    /// failed.
    #[error("failed to rewrite remotes for {path}: {message}")]
    RemoteRewriteFailed {
        /// Repository path.
        path: PathBuf,
        /// Captured stderr (trimmed).
        message: String,
    },

    /// `path` is not a git working tree.
    #[error("not a git repository: {path}")]
    NotRepository {
        /// Path that is not a repository.
        path: PathBuf,
    },

    /// The `git` executable could not be spawned (not installed or not in
    /// PATH).
    #[error("git is not installed or not in PATH")]
    ToolNotAvailable,

    /// Filesystem I/O error with path context.
    #[error("io error at {}: {message}", path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl VcsError {
    /// Build an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<VcsError> for repoutils_core::Error {
    fn from(err: VcsError) -> Self {
        match err {
            VcsError::ToolNotAvailable => repoutils_core::Error::subprocess_spawn(
                "git",
                &std::io::Error::new(std::io::ErrorKind::NotFound, "git not found"),
            ),
            VcsError::Io { path, message } => repoutils_core::Error::Os {
                path,
                message,
                hint: None,
            },
            other => repoutils_core::Error::validation(other.to_string(), None),
        }
    }
}

/// Result type for git backend operations.
pub type Result<T> = std::result::Result<T, VcsError>;
