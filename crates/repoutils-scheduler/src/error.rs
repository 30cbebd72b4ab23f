//! Error types for the subpackage scheduler.

use thiserror::Error;

/// Scheduler-level error: something that aborts the whole run rather than
/// a single subpackage fetch (those become `FetchOutcome::Failed` instead).
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The root project config could not be parsed.
    #[error("invalid project configuration: {0}")]
    Config(#[from] repoutils_config::ConfigError),
}

impl From<SchedulerError> for repoutils_core::Error {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::Config(e) => e.into(),
        }
    }
}

/// Result type for scheduler-level (non-per-ref) operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
