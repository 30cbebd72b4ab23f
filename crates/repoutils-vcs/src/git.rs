//! The git fetch backend: clone, pull-equivalent, and post-clone remote
//! rewriting for mirrored fetches (spec §4.5.1).

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{Result, VcsError};

/// Options controlling a git fetch, mirroring the scheduler's per-ref
/// `{shallow, branch, useMirror}` options plus a strictness flag for
/// re-fetching an existing checkout.
#[derive(Debug, Clone)]
pub struct GitOptions {
    /// Use `--depth 1` on clone.
    pub shallow: bool,
    /// Branch to check out; defaults to `"main"` if unset.
    pub branch: String,
    /// When `true`, an already-present working tree is an error instead of
    /// being pulled.
    pub strict: bool,
    /// Pass `--recurse-submodules --shallow-submodules` on clone.
    pub recurse_submodules: bool,
}

impl Default for GitOptions {
    fn default() -> Self {
        Self {
            shallow: true,
            branch: "main".to_string(),
            strict: false,
            recurse_submodules: true,
        }
    }
}

/// Shells out to the `git` CLI. Kept separate from the extraction/registry
/// crates since every operation here is a subprocess invocation rather than
/// an in-process decode.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitBackend;

impl GitBackend {
    /// Fetch `url` into `dest`, cloning if absent or pulling if a working
    /// tree already exists there (unless `options.strict`).
    pub async fn fetch(&self, url: &str, dest: &Path, options: &GitOptions) -> Result<()> {
        if Self::is_repository(dest).await {
            if options.strict {
                return Err(VcsError::AlreadyPresent {
                    path: dest.to_path_buf(),
                });
            }
            return self.pull(dest, &options.branch).await;
        }
        self.clone(url, dest, options).await
    }

    /// Whether `path` is the root of a git working tree.
    pub async fn is_repository(path: &Path) -> bool {
        path.join(".git").exists()
    }

    async fn clone(&self, url: &str, dest: &Path, options: &GitOptions) -> Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VcsError::io(parent, e))?;
        }

        debug!(url, dest = %dest.display(), "cloning repository");

        let mut cmd = Command::new("git");
        cmd.kill_on_drop(true);
        cmd.arg("clone").arg("--verbose");
        cmd.arg("--branch").arg(&options.branch);
        if options.shallow {
            cmd.arg("--depth").arg("1");
        }
        if options.recurse_submodules {
            cmd.arg("--recurse-submodules").arg("--shallow-submodules");
        }
        cmd.arg(url).arg(dest);

        let output = cmd
            .output()
            .await
            .map_err(|_| VcsError::ToolNotAvailable)?;

        if !output.status.success() {
            return Err(VcsError::CloneFailed {
                url: url.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(url, dest = %dest.display(), "clone complete");
        Ok(())
    }

    async fn pull(&self, dest: &Path, branch: &str) -> Result<()> {
        debug!(dest = %dest.display(), branch, "updating existing checkout");

        let fetch = Command::new("git")
            .arg("-C")
            .arg(dest)
            .arg("fetch")
            .arg("origin")
            .arg(branch)
            .output()
            .await
            .map_err(|_| VcsError::ToolNotAvailable)?;
        if !fetch.status.success() {
            return Err(VcsError::PullFailed {
                path: dest.to_path_buf(),
                message: String::from_utf8_lossy(&fetch.stderr).trim().to_string(),
            });
        }

        let merge = Command::new("git")
            .arg("-C")
            .arg(dest)
            .arg("merge")
            .arg("--ff-only")
            .arg(format!("origin/{branch}"))
            .output()
            .await
            .map_err(|_| VcsError::ToolNotAvailable)?;
        if !merge.status.success() {
            return Err(VcsError::PullFailed {
                path: dest.to_path_buf(),
                message: String::from_utf8_lossy(&merge.stderr).trim().to_string(),
            });
        }

        Ok(())
    }

    /// After a mirrored clone, rewrite remotes so the working tree records
    /// the canonical origin: `origin` becomes `official_url`, a new `mirror`
    /// remote points at the URL actually used, and the current branch's
    /// upstream is set to `origin/<branch>`.
    pub async fn restore_canonical_origin(
        &self,
        dest: &Path,
        official_url: &str,
        mirror_url: &str,
        branch: &str,
    ) -> Result<()> {
        run(dest, &["remote", "set-url", "origin", official_url]).await?;
        run(dest, &["remote", "add", "mirror", mirror_url]).await?;
        run(
            dest,
            &[
                "branch",
                &format!("--set-upstream-to=origin/{branch}"),
                branch,
            ],
        )
        .await?;
        Ok(())
    }
}

async fn run(dest: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dest)
        .args(args)
        .output()
        .await
        .map_err(|_| VcsError::ToolNotAvailable)?;
    if !output.status.success() {
        warn!(
            dest = %dest.display(),
            args = ?args,
            stderr = %String::from_utf8_lossy(&output.stderr),
            "git remote rewrite command failed"
        );
        return Err(VcsError::RemoteRewriteFailed {
            path: dest.to_path_buf(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// Path helper shared by callers that need to know whether a destination
/// already looks like a git checkout before dispatching.
#[must_use]
pub fn looks_like_repository(path: &Path) -> bool {
    path.join(".git").is_dir()
}
