//! Error types for workflow parsing and execution.

use thiserror::Error;

/// Failure parsing or running a workflow.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A step's `kind` has no registered constructor.
    #[error("unknown step kind '{kind}' in step '{id}'")]
    UnknownKind {
        /// The step id this occurred in.
        id: String,
        /// The unrecognized kind string.
        kind: String,
    },
    /// Two steps in the same workflow declared the same id.
    #[error("duplicate step id '{id}' in workflow '{workflow}'")]
    DuplicateStepId {
        /// The workflow name.
        workflow: String,
        /// The repeated id.
        id: String,
    },
    /// A step failed `init` (param validation).
    #[error("step '{id}' failed to initialize: {message}")]
    InitFailed {
        /// The step id.
        id: String,
        /// Validation error detail.
        message: String,
    },
    /// A step's `run` raised, aborting the workflow.
    #[error("step '{id}' failed: {message}")]
    StepFailed {
        /// The step id.
        id: String,
        /// Error detail.
        message: String,
    },
    /// Malformed step/workflow AFM (missing `kind`, `id`, or similar).
    #[error("invalid workflow configuration: {0}")]
    Config(#[from] repoutils_config::ConfigError),
}

impl From<WorkflowError> for repoutils_core::Error {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::Config(e) => e.into(),
            _ => repoutils_core::Error::validation(message, None),
        }
    }
}

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;
