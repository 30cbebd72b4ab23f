//! Temporary project creation and management for integration tests.
//!
//! This module provides utilities to create isolated test workspaces with
//! a `repo.json` project file, subpackage destinations, and hook
//! definitions.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};
use tokio::fs;

use crate::fixtures::Fixtures;

/// A temporary project directory for testing.
///
/// The project is automatically cleaned up when this struct is dropped.
#[derive(Debug)]
pub struct TempProject {
    /// The temporary directory containing the project.
    dir: TempDir,
    /// Path to the project file (`repo.json`).
    project_file_path: PathBuf,
}

impl TempProject {
    /// Create a new temporary project builder.
    #[must_use]
    pub fn new() -> TempProjectBuilder {
        TempProjectBuilder::default()
    }

    /// Get the root directory of the project.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Get the path to the project file.
    #[must_use]
    pub fn project_file_path(&self) -> &Path {
        &self.project_file_path
    }

    /// Read and parse the project file.
    pub async fn read_project_file(&self) -> Result<Value> {
        let content = fs::read_to_string(&self.project_file_path)
            .await
            .context("failed to read project file")?;
        serde_json::from_str(&content).context("failed to parse project file")
    }

    /// Overwrite the project file content.
    pub async fn write_project_file(&self, content: &Value) -> Result<()> {
        let json = serde_json::to_string_pretty(content)?;
        fs::write(&self.project_file_path, json)
            .await
            .context("failed to write project file")
    }

    /// Create a file in the project directory.
    pub async fn create_file(&self, relative_path: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await?;
        Ok(path)
    }

    /// Create a directory in the project.
    pub async fn create_dir(&self, relative_path: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(relative_path);
        fs::create_dir_all(&path).await?;
        Ok(path)
    }

    /// Check if a file or directory exists in the project.
    pub async fn file_exists(&self, relative_path: &str) -> bool {
        let path = self.dir.path().join(relative_path);
        fs::metadata(&path).await.is_ok()
    }

    /// Read a file from the project.
    pub async fn read_file(&self, relative_path: &str) -> Result<String> {
        let path = self.dir.path().join(relative_path);
        fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read file: {relative_path}"))
    }

    /// Load this project through the real config loader, the way
    /// `repoutils-cli` does on startup.
    pub fn load(&self) -> Result<repoutils_config::ProjectConfig> {
        let variables = repoutils_core::VariableStore::with_builtins("test", "repoutils-test-utils");
        let afm = repoutils_config::Loader::new(variables).load(&self.project_file_path)?;
        Ok(repoutils_config::ProjectConfig::from_afm(afm, &self.project_file_path)?)
    }

    /// Keep the temporary directory (prevent cleanup on drop).
    /// Returns the path to the directory.
    #[must_use]
    pub fn persist(self) -> PathBuf {
        let path = self.dir.path().to_path_buf();
        std::mem::forget(self);
        path
    }
}

impl Default for TempProject {
    fn default() -> Self {
        futures::executor::block_on(async {
            TempProjectBuilder::default()
                .build()
                .await
                .expect("failed to create default TempProject")
        })
    }
}

/// Builder for creating temporary projects.
#[derive(Debug, Default)]
pub struct TempProjectBuilder {
    project_file: Option<Value>,
    file_name: Option<String>,
    files: Vec<(String, String)>,
}

impl TempProjectBuilder {
    /// Set the project file content, decoded as `repo.json` by default.
    #[must_use]
    pub fn with_project_file(mut self, content: Value) -> Self {
        self.project_file = Some(content);
        self
    }

    /// Use a non-default project file name (e.g. `repo.toml`'s JSON-shaped
    /// equivalent content, still written out as JSON for `repo.json5`
    /// compatibility).
    #[must_use]
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Add a file to be created under the project root.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    /// Use the single-git-subpackage fixture.
    #[must_use]
    pub fn with_git_subpackage(mut self, remote_url: impl Into<String>) -> Self {
        self.project_file = Some(Fixtures::single_git_subpackage_json(&remote_url.into()));
        self
    }

    /// Use the post-fetch-hook fixture.
    #[must_use]
    pub fn with_post_fetch_hook(mut self) -> Self {
        self.project_file = Some(Fixtures::project_with_post_fetch_hook_json());
        self
    }

    /// Build the temporary project.
    pub async fn build(self) -> Result<TempProject> {
        let dir = tempdir().context("failed to create temp directory")?;
        let root = dir.path();

        let file_name = self.file_name.unwrap_or_else(|| "repo.json".to_string());
        let project_file_path = root.join(&file_name);
        let project_file = self.project_file.unwrap_or_else(Fixtures::empty_project_json);
        let json_content = serde_json::to_string_pretty(&project_file)?;
        fs::write(&project_file_path, json_content)
            .await
            .context("failed to write project file")?;

        for (path, content) in self.files {
            let file_path = root.join(&path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;
        }

        Ok(TempProject {
            dir,
            project_file_path,
        })
    }
}

/// Create multiple temporary projects for batch testing.
pub async fn create_test_projects(count: usize) -> Result<Vec<TempProject>> {
    let mut projects = Vec::with_capacity(count);
    for i in 0..count {
        let project = TempProject::new()
            .with_project_file(serde_json::json!({
                "name": format!("test-project-{}", i),
                "version": "1.0.0",
                "subpackages": []
            }))
            .build()
            .await?;
        projects.push(project);
    }
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_temp_project() {
        let project = TempProject::new().build().await.unwrap();

        assert!(project.path().exists());
        assert!(project.project_file_path().exists());
    }

    #[tokio::test]
    async fn load_decodes_a_valid_project() {
        let project = TempProject::new()
            .with_git_subpackage("https://example.test/widgets.git")
            .build()
            .await
            .unwrap();

        let config = project.load().unwrap();
        assert_eq!(config.name, "test-project");
        assert_eq!(config.subpackages().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_with_git_subpackage() {
        let project = TempProject::new()
            .with_git_subpackage("https://example.test/widgets.git")
            .build()
            .await
            .unwrap();

        let decoded = project.read_project_file().await.unwrap();
        assert_eq!(decoded["subpackages"][0]["remote-url"], "https://example.test/widgets.git");
    }

    #[tokio::test]
    async fn create_with_post_fetch_hook() {
        let project = TempProject::new().with_post_fetch_hook().build().await.unwrap();

        let decoded = project.read_project_file().await.unwrap();
        assert!(decoded["hooks"]["post-fetch"].is_object());
    }

    #[tokio::test]
    async fn create_file() {
        let project = TempProject::new().build().await.unwrap();

        project
            .create_file("vendor/widgets/README.md", "# widgets")
            .await
            .unwrap();

        assert!(project.file_exists("vendor/widgets/README.md").await);
        let content = project.read_file("vendor/widgets/README.md").await.unwrap();
        assert!(content.contains("widgets"));
    }
}
