//! The cross-cutting error taxonomy shared by every repoutils crate.
//!
//! Each error carries a [`Kind`], an optional `hint` aimed at a human reading
//! the CLI output, and an optional `docurl`. Crate-specific error enums
//! (`ConfigError`, `MirrorError`, `VcsError`, `ArchiveError`,
//! `SchedulerError`, `WorkflowError`) wrap or convert into [`Error`] at their
//! crate boundary so the CLI only has to match on one type.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The seven error kinds of the taxonomy. Distinct from the concrete error
/// variant: several variants can share a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Config value missing or wrong type.
    Validation,
    /// Directory does not contain a project file.
    NotAProject,
    /// Directory does not contain an extension descriptor.
    NotAnExtension,
    /// Filesystem permission, missing path, disk full.
    Os,
    /// Child process exited non-zero, or could not be spawned.
    Subprocess,
    /// Unreachable host, timeout, HTTP status >= 400.
    Network,
    /// Cooperative cancellation requested by the user.
    UserInterrupt,
}

impl Kind {
    /// Stable string form, used in error codes and test assertions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotAProject => "not-a-project",
            Self::NotAnExtension => "not-an-extension",
            Self::Os => "os",
            Self::Subprocess => "subprocess",
            Self::Network => "network",
            Self::UserInterrupt => "user-interrupt",
        }
    }

    /// The process exit code this kind maps to (spec §6), absent a more
    /// specific mapping at the CLI layer.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::UserInterrupt => 130,
            Self::Validation | Self::NotAProject | Self::NotAnExtension => 1,
            Self::Os | Self::Subprocess | Self::Network => 1,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The shared error type. Crate-local error enums convert into this at
/// their public boundary (e.g. the scheduler's aggregate outcome, or the
/// CLI's top-level `main` match).
#[derive(Error, Debug)]
pub enum Error {
    /// A config value was missing or had the wrong declared type.
    #[error("{message}")]
    Validation {
        /// What went wrong.
        message: String,
        /// File or config key this pertains to, if known.
        path: Option<PathBuf>,
        /// Actionable next step for the user.
        hint: Option<String>,
    },

    /// The directory does not contain a recognized project file.
    #[error("not a project: {path}")]
    NotAProject {
        /// Directory that was checked.
        path: PathBuf,
        /// Actionable next step for the user.
        hint: Option<String>,
    },

    /// The directory does not contain a recognized extension descriptor.
    #[error("not an extension: {path}")]
    NotAnExtension {
        /// Directory that was checked.
        path: PathBuf,
        /// Actionable next step for the user.
        hint: Option<String>,
    },

    /// Filesystem error: permission, missing path, disk full.
    #[error("{message}")]
    Os {
        /// Path the operation was performed against.
        path: PathBuf,
        /// Underlying message (from `std::io::Error` or equivalent).
        message: String,
        /// Actionable next step for the user.
        hint: Option<String>,
    },

    /// A child process exited non-zero, or could not be spawned at all.
    #[error("{command} failed: {message}")]
    Subprocess {
        /// The program that was invoked.
        command: String,
        /// stderr tail or spawn error message.
        message: String,
        /// Exit code, if the process started and exited.
        exit_code: Option<i32>,
        /// True when the command itself could not be found/started.
        command_not_found: bool,
        /// Actionable next step for the user.
        hint: Option<String>,
    },

    /// Unreachable host, timeout, or HTTP status >= 400.
    #[error("{message}")]
    Network {
        /// The URL that failed, if applicable.
        url: Option<String>,
        /// Underlying message.
        message: String,
        /// Actionable next step for the user.
        hint: Option<String>,
    },

    /// Cooperative cancellation requested by the user (Ctrl+C equivalent).
    #[error("interrupted")]
    UserInterrupt,
}

impl Error {
    /// The taxonomy kind for this error.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Validation { .. } => Kind::Validation,
            Self::NotAProject { .. } => Kind::NotAProject,
            Self::NotAnExtension { .. } => Kind::NotAnExtension,
            Self::Os { .. } => Kind::Os,
            Self::Subprocess { .. } => Kind::Subprocess,
            Self::Network { .. } => Kind::Network,
            Self::UserInterrupt => Kind::UserInterrupt,
        }
    }

    /// The hint attached to this error, if any.
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Validation { hint, .. }
            | Self::NotAProject { hint }
            | Self::NotAnExtension { hint }
            | Self::Os { hint, .. }
            | Self::Subprocess { hint, .. }
            | Self::Network { hint, .. } => hint.as_deref(),
            Self::UserInterrupt => None,
        }
    }

    /// Build a validation error with an optional path and hint.
    #[must_use]
    pub fn validation(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Validation {
            message: message.into(),
            path,
            hint: None,
        }
    }

    /// Build an OS error from a `std::io::Error`, choosing a hint by kind.
    #[must_use]
    pub fn os(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        let path = path.into();
        let hint = match err.kind() {
            std::io::ErrorKind::NotFound => Some(format!("check that {} exists", path.display())),
            std::io::ErrorKind::PermissionDenied => {
                Some(format!("check permissions on {}", path.display()))
            }
            _ => None,
        };
        Self::Os {
            path,
            message: err.to_string(),
            hint,
        }
    }

    /// Build a subprocess error, detecting "command not found" from the
    /// spawn error kind.
    #[must_use]
    pub fn subprocess_spawn(command: impl Into<String>, err: &std::io::Error) -> Self {
        let command = command.into();
        let not_found = err.kind() == std::io::ErrorKind::NotFound;
        Self::Subprocess {
            hint: not_found.then(|| format!("is `{command}` installed and on PATH?")),
            command,
            message: err.to_string(),
            exit_code: None,
            command_not_found: not_found,
        }
    }

    /// Build a subprocess error from a completed, non-zero exit.
    #[must_use]
    pub fn subprocess_exit(
        command: impl Into<String>,
        message: impl Into<String>,
        exit_code: i32,
    ) -> Self {
        Self::Subprocess {
            command: command.into(),
            message: message.into(),
            exit_code: Some(exit_code),
            command_not_found: false,
            hint: None,
        }
    }

    /// Build a network error, with an optional URL for context.
    #[must_use]
    pub fn network(message: impl Into<String>, url: Option<String>) -> Self {
        Self::Network {
            url,
            message: message.into(),
            hint: None,
        }
    }

    /// Attach (or replace) the hint on this error.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint = Some(hint.into());
        match &mut self {
            Self::Validation { hint: h, .. }
            | Self::NotAProject { hint: h }
            | Self::NotAnExtension { hint: h }
            | Self::Os { hint: h, .. }
            | Self::Subprocess { hint: h, .. }
            | Self::Network { hint: h, .. } => *h = hint,
            Self::UserInterrupt => {}
        }
        self
    }

    /// Render the error plus its hint, the shape the CLI prints to stderr.
    #[must_use]
    pub fn display_with_hint(&self) -> String {
        let mut out = self.to_string();
        if let Some(hint) = self.hint() {
            out.push_str("\n\nhint: ");
            out.push_str(hint);
        }
        out
    }
}

/// Result alias used throughout repoutils crates.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_exit_codes() {
        assert_eq!(Kind::UserInterrupt.exit_code(), 130);
        assert_eq!(Kind::Validation.exit_code(), 1);
        assert_eq!(Kind::Network.exit_code(), 1);
    }

    #[test]
    fn os_error_hints_at_not_found() {
        let io_err = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err = Error::os("/tmp/missing", &io_err);
        assert_eq!(err.kind(), Kind::Os);
        assert!(err.hint().unwrap().contains("missing"));
    }

    #[test]
    fn subprocess_detects_command_not_found() {
        let io_err = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err = Error::subprocess_spawn("git", &io_err);
        match err {
            Error::Subprocess {
                command_not_found, ..
            } => assert!(command_not_found),
            _ => panic!("expected Subprocess"),
        }
    }

    #[test]
    fn display_with_hint_appends_hint() {
        let err = Error::validation("missing field 'name'", None).with_hint("add a name field");
        let rendered = err.display_with_hint();
        assert!(rendered.contains("missing field"));
        assert!(rendered.contains("add a name field"));
    }
}
