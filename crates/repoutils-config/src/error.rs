//! Error types for configuration loading and the AFM document model.

use std::path::PathBuf;
use thiserror::Error;

use crate::afm::ValueType;

/// Configuration error type. Every variant maps to the `Validation` or `Os`
/// kind of the shared taxonomy (see `repoutils_core::error::Kind`).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {}", path.display())]
    NotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// The file extension is not one of the recognized config formats.
    #[error("unrecognized configuration format: {}", path.display())]
    UnknownFormat {
        /// Path with the unrecognized extension.
        path: PathBuf,
    },

    /// Decode error (JSON, TOML, YAML, or INI), with file context.
    #[error("failed to parse {}: {message}", path.display())]
    Decode {
        /// File path.
        path: PathBuf,
        /// Underlying decoder message.
        message: String,
    },

    /// A required field was absent.
    #[error("missing required field '{key}'")]
    MissingField {
        /// Field name.
        key: String,
    },

    /// A field had the wrong declared type.
    #[error("field '{key}' has the wrong type: expected {expected:?}")]
    TypeMismatch {
        /// Field name.
        key: String,
        /// Expected type.
        expected: ValueType,
    },

    /// A subpackage descriptor was rejected (incomplete virtual descriptor,
    /// unknown virtual scheme, or an unrecognized `type`).
    #[error("invalid subpackage descriptor: {message}")]
    InvalidSubpackage {
        /// Description of the problem.
        message: String,
    },

    /// The `version` field is not a valid semantic version.
    #[error("field 'version' is not a valid semantic version: '{version}' ({message})")]
    InvalidVersion {
        /// The raw value that failed to parse.
        version: String,
        /// Underlying parser message.
        message: String,
    },

    /// Filesystem I/O error with path context.
    #[error("IO error at {}: {message}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Build an I/O error, choosing [`ConfigError::NotFound`] for missing
    /// files.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound { path };
        }
        Self::Io {
            path,
            message: err.to_string(),
        }
    }

    /// Build a decode error with file context.
    #[must_use]
    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build a missing-field error.
    #[must_use]
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingField { key: key.into() }
    }

    /// Build a type-mismatch error.
    #[must_use]
    pub fn type_mismatch(key: impl Into<String>, expected: ValueType) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected,
        }
    }
}

impl From<ConfigError> for repoutils_core::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io { path, message } => Self::Os {
                path,
                message,
                hint: None,
            },
            other => Self::validation(other.to_string(), None),
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
