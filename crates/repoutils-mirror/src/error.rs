//! Errors for mirror registry loading and resolution.

use thiserror::Error;

/// Mirror registry/resolver error type.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// The registry has no `official` entry for a host/protocol pair that
    /// was otherwise referenced.
    #[error("mirror registry has no 'official' entry for {host}/{protocol}")]
    MissingOfficial {
        /// Host token.
        host: String,
        /// Protocol name.
        protocol: String,
    },

    /// A malformed `user/repo@host` reference.
    #[error("not a valid user/repo@host reference: {reference}")]
    MalformedReference {
        /// The offending reference string.
        reference: String,
    },
}

impl From<MirrorError> for repoutils_core::Error {
    fn from(err: MirrorError) -> Self {
        Self::validation(err.to_string(), None)
    }
}

/// Result type for mirror operations.
pub type Result<T> = std::result::Result<T, MirrorError>;
