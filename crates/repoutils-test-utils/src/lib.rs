//! Shared testing utilities for repoutils.
//!
//! This crate provides test helpers, fixtures, and mock servers for testing
//! config loading, mirror resolution, subpackage fetching, and the
//! workflow engine end to end.
//!
//! # Modules
//!
//! - [`fixtures`]: pre-built project-file and mirrorlist fixtures
//! - [`mock_server`]: HTTP mock servers for mirror races and archive
//!   downloads
//! - [`temp_project`]: temporary project workspace creation
//! - [`git_utils`]: git repository test utilities
//!
//! # Example
//!
//! ```rust,no_run
//! use repoutils_test_utils::temp_project::TempProject;
//!
//! #[tokio::test]
//! async fn test_fetch() {
//!     let project = TempProject::new()
//!         .with_git_subpackage("https://example.test/widgets.git")
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     // Run the scheduler against project.project_file_path()
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod fixtures;
pub mod git_utils;
pub mod mock_server;
pub mod temp_project;

/// Re-export commonly used testing utilities.
pub mod prelude {
    pub use crate::fixtures::Fixtures;
    pub use crate::git_utils::TempGitRepo;
    pub use crate::mock_server::{MockArchiveServer, MockMirror};
    pub use crate::temp_project::TempProject;

    pub use pretty_assertions::{assert_eq, assert_ne};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modules_are_accessible() {
        let _ = fixtures::Fixtures::empty_project_json();
    }
}
