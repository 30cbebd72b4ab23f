//! Configuration loading and the project data model: the auto-formatting
//! map document type, layered file loading with includes and `.d`
//! fragments, and the typed `ProjectConfig`/`SubpackageRef` view over a
//! loaded project file.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod afm;
pub mod error;
pub mod loader;
pub mod project;
pub mod resolved;

pub use afm::{Afm, ValueType};
pub use error::{ConfigError, Result};
pub use loader::Loader;
pub use project::{find_project_file, ProjectConfig, SubpackageKind, SubpackageRef};
pub use resolved::{ResolvedConfig, DEFAULT_RESOLVER_TIMEOUT_MS};
