//! Project configuration: the derived view of a loaded project file plus its
//! subpackage list and hook workflow definitions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::afm::Afm;
use crate::error::{ConfigError, Result};

/// The kind of a subpackage source, decoded from the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubpackageKind {
    /// Fetched by cloning a git repository.
    Git,
    /// Fetched by downloading and extracting an archive.
    Archive,
    /// A no-op placeholder, provided by other means.
    Virtual,
}

impl SubpackageKind {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "git" => Ok(Self::Git),
            "archive" => Ok(Self::Archive),
            "virtual" => Ok(Self::Virtual),
            other => Err(ConfigError::InvalidSubpackage {
                message: format!("unknown subpackage type '{other}'"),
            }),
        }
    }
}

/// A single subpackage descriptor, materialized from one entry of the
/// project file's `subpackages` list.
#[derive(Debug, Clone)]
pub struct SubpackageRef {
    /// Human-readable name, if given.
    pub name: Option<String>,
    /// Destination path(s), project-relative. Per the spec's open question,
    /// a bare string is normalized to a single-element list; callers should
    /// use only the first entry and warn if more than one was given.
    pub paths: Vec<String>,
    /// The fetch backend this ref dispatches to.
    pub kind: SubpackageKind,
    /// Source URL, required for `git`/`archive`.
    pub url: Option<String>,
    /// Git branch, defaulting to `"main"` for git refs.
    pub git_branch: Option<String>,
    /// Archive type (`"tar.gz"`, `"zip"`, `"7z"`, …), required for archive
    /// refs.
    pub archive_type: Option<String>,
    /// Optional human-readable description.
    pub description: Option<String>,
}

impl SubpackageRef {
    /// Materialize a ref from one `subpackages` list entry.
    pub fn from_afm(afm: &Afm) -> Result<Self> {
        let kind = SubpackageKind::parse(&afm.get_string("type")?)?;
        let paths = afm.get_string_list("path");
        if paths.is_empty() {
            return Err(ConfigError::missing_key("path"));
        }
        if paths.len() > 1 {
            tracing::warn!(
                paths = ?paths,
                "subpackage declares multiple paths; only the first is used"
            );
        }

        let url = match afm.get_string("remote-url") {
            Ok(u) => Some(u),
            Err(_) => None,
        };
        if matches!(kind, SubpackageKind::Git | SubpackageKind::Archive) && url.is_none() {
            return Err(ConfigError::InvalidSubpackage {
                message: "git and archive subpackages require 'remote-url'".to_string(),
            });
        }

        let archive_type = match afm.get_string("archive-type") {
            Ok(t) => Some(t),
            Err(_) => None,
        };
        if matches!(kind, SubpackageKind::Archive) && archive_type.is_none() {
            return Err(ConfigError::InvalidSubpackage {
                message: "archive subpackages require 'archive-type'".to_string(),
            });
        }

        Ok(Self {
            name: (!afm.get_string_or("name", "").is_empty())
                .then(|| afm.get_string_or("name", "")),
            paths,
            kind,
            url,
            git_branch: matches!(kind, SubpackageKind::Git)
                .then(|| afm.get_string_or("git-branch", "main")),
            archive_type,
            description: (!afm.get_string_or("description", "").is_empty())
                .then(|| afm.get_string_or("description", "")),
        })
    }

    /// The single destination path this ref uses (the first of `paths`).
    #[must_use]
    pub fn primary_path(&self) -> &str {
        &self.paths[0]
    }
}

/// The derived, typed view of a loaded project file.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Absolute path to the source project file.
    pub source_path: PathBuf,
    /// Directory containing the project file.
    pub root_dir: PathBuf,
    /// Project name.
    pub name: String,
    /// Project version.
    pub version: String,
    /// Optional description.
    pub description: Option<String>,
    /// Minimum required tool version, if declared.
    pub min_tool_version: Option<String>,
    /// The raw AFM, retained for workflow step params and anything the
    /// typed view does not surface.
    pub raw: Afm,
    /// Named hook workflow definitions, each an AFM slice of the `hooks`
    /// map — parsed into `repoutils_workflow::Workflow` by that crate, kept
    /// raw here to avoid a circular dependency.
    pub hooks: HashMap<String, Afm>,
}

impl ProjectConfig {
    /// Build the typed view from a loaded AFM and the path it came from.
    pub fn from_afm(afm: Afm, source_path: impl Into<PathBuf>) -> Result<Self> {
        let source_path = source_path.into();
        let root_dir = source_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let name = afm.get_string("name")?;
        let version = afm.get_string("version")?;
        semver::Version::parse(&version).map_err(|e| ConfigError::InvalidVersion {
            version: version.clone(),
            message: e.to_string(),
        })?;
        let description = match afm.get_string("description") {
            Ok(d) => Some(d),
            Err(_) => None,
        };
        let min_tool_version = match afm.get_string("repoutils-min-version") {
            Ok(v) => Some(v),
            Err(_) => None,
        };

        let hooks_map = afm.get_map("hooks");
        let mut hooks = HashMap::new();
        for key in hooks_map.keys().map(str::to_string).collect::<Vec<_>>() {
            hooks.insert(key.clone(), hooks_map.get_map(&key));
        }

        Ok(Self {
            source_path,
            root_dir,
            name,
            version,
            description,
            min_tool_version,
            raw: afm,
            hooks,
        })
    }

    /// Materialize the `subpackages` list as typed refs, in the order they
    /// were declared (configuration order, per spec §4.6).
    pub fn subpackages(&self) -> Result<Vec<SubpackageRef>> {
        self.raw
            .get_map_list("subpackages")
            .iter()
            .map(SubpackageRef::from_afm)
            .collect()
    }

    /// Resolve `relative` against this project's root directory.
    #[must_use]
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        self.root_dir.join(relative)
    }
}

/// The recognized project file base name, in decoding-format preference
/// order (spec §6: "`repo.json` or any supported extension variant").
const PROJECT_FILE_CANDIDATES: &[&str] = &[
    "repo.json",
    "repo.json5",
    "repo.toml",
    "repo.ini",
    "repo.cfg",
    "repo.yaml",
    "repo.yml",
];

/// Locate a project file directly inside `dir`, trying each recognized
/// extension in order. Used by the scheduler to detect whether a freshly
/// fetched subpackage is itself a project root.
#[must_use]
pub fn find_project_file(dir: &Path) -> Option<PathBuf> {
    PROJECT_FILE_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoutils_core::VariableStore;
    use serde_json::json;

    fn project(json_value: serde_json::Value) -> Result<ProjectConfig> {
        let afm = Afm::from_plain(
            repoutils_core::Value::from_json(json_value),
            VariableStore::new(),
        );
        ProjectConfig::from_afm(afm, "/tmp/project/repo.json")
    }

    #[test]
    fn requires_name_and_version() {
        assert!(project(json!({})).is_err());
        assert!(project(json!({"name": "a", "version": "1.0.0"})).is_ok());
    }

    #[test]
    fn non_semver_version_is_rejected() {
        assert!(project(json!({"name": "a", "version": "latest"})).is_err());
        assert!(project(json!({"name": "a", "version": "1.0"})).is_err());
    }

    #[test]
    fn parses_git_subpackage() {
        let p = project(json!({
            "name": "a", "version": "1.0.0",
            "subpackages": [
                {"path": "vendor/b", "type": "git", "remote-url": "github:alice/b"}
            ]
        }))
        .unwrap();
        let subs = p.subpackages().unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].kind, SubpackageKind::Git);
        assert_eq!(subs[0].git_branch.as_deref(), Some("main"));
    }

    #[test]
    fn archive_without_archive_type_is_rejected() {
        let p = project(json!({
            "name": "a", "version": "1.0.0",
            "subpackages": [
                {"path": "vendor/b", "type": "archive", "remote-url": "https://example.org/b.tar.gz"}
            ]
        }))
        .unwrap();
        assert!(p.subpackages().is_err());
    }

    #[test]
    fn unknown_subpackage_type_is_rejected() {
        let p = project(json!({
            "name": "a", "version": "1.0.0",
            "subpackages": [{"path": "x", "type": "ftp"}]
        }))
        .unwrap();
        assert!(p.subpackages().is_err());
    }

    #[test]
    fn find_project_file_prefers_json() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_project_file(dir.path()).is_none());
        std::fs::write(dir.path().join("repo.toml"), "name = \"a\"").unwrap();
        assert_eq!(find_project_file(dir.path()), Some(dir.path().join("repo.toml")));
        std::fs::write(dir.path().join("repo.json"), "{}").unwrap();
        assert_eq!(find_project_file(dir.path()), Some(dir.path().join("repo.json")));
    }
}
