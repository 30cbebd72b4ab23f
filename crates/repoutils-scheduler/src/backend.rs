//! The shared fetch interface and per-kind backend dispatch (spec §4.5).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use repoutils_archive::{ArchiveBackend, ArchiveType, DenyOverwrite, OverwritePolicy};
use repoutils_config::{SubpackageKind, SubpackageRef};
use repoutils_core::CancellationToken;
use repoutils_mirror::{MirrorResolver, Resolution};
use repoutils_vcs::{GitBackend, GitOptions};

use crate::outcome::FetchOutcome;

/// How often the cancellation race re-checks the token while a backend
/// operation is in flight.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Resolves once `token` is cancelled. Used to race a backend future so an
/// in-flight clone or download is abandoned promptly instead of running to
/// completion.
async fn wait_cancelled(token: &CancellationToken) {
    while !token.is_cancelled() {
        tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
    }
}

/// Per-fetch options threaded down from the scheduler, mirroring the
/// spec's `{shallow, branch, useMirror}` options bag.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// `--depth 1` for git, not meaningful for archive/virtual.
    pub shallow: bool,
    /// Whether an existing destination is an error (`true`) or gets a
    /// pull-equivalent update (`false`).
    pub strict: bool,
    /// Resolve through the mirror registry before dispatching git/archive.
    pub use_mirror: bool,
    /// Mirror protocol preference (`"http"` or `"ssh"`).
    pub protocol: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            shallow: true,
            strict: false,
            use_mirror: true,
            protocol: "http".to_string(),
        }
    }
}

/// Dispatches a [`SubpackageRef`] to its backend, resolving mirrors first
/// when applicable.
pub struct Dispatcher {
    git: GitBackend,
    archive: ArchiveBackend,
    mirror: Option<Arc<MirrorResolver>>,
    overwrite: Arc<dyn OverwritePolicy>,
}

impl Dispatcher {
    /// Build a dispatcher. `mirror` is `None` to disable mirror resolution
    /// entirely regardless of `FetchOptions::use_mirror`.
    pub fn new(mirror: Option<Arc<MirrorResolver>>) -> repoutils_archive::Result<Self> {
        Ok(Self {
            git: GitBackend,
            archive: ArchiveBackend::new()?,
            mirror,
            overwrite: Arc::new(DenyOverwrite),
        })
    }

    /// Override the overwrite-confirmation policy (wired to a UCI prompt
    /// by the CLI).
    #[must_use]
    pub fn with_overwrite_policy(mut self, policy: Arc<dyn OverwritePolicy>) -> Self {
        self.overwrite = policy;
        self
    }

    /// Fetch `subpackage` into `dest` according to `options`. `cancellation`
    /// is raced against the backend operation: if it fires first, the
    /// in-flight clone or download is abandoned and this returns a
    /// `UserInterrupt`-kind failure instead of waiting for completion.
    pub async fn fetch(
        &self,
        subpackage: &SubpackageRef,
        dest: &Path,
        options: &FetchOptions,
        cancellation: &CancellationToken,
    ) -> FetchOutcome {
        if cancellation.is_cancelled() {
            return FetchOutcome::failed(repoutils_core::Error::UserInterrupt);
        }
        let operation: std::pin::Pin<Box<dyn std::future::Future<Output = FetchOutcome> + Send + '_>> =
            match subpackage.kind {
                SubpackageKind::Virtual => return FetchOutcome::Fetched,
                SubpackageKind::Git => Box::pin(self.fetch_git(subpackage, dest, options)),
                SubpackageKind::Archive => Box::pin(self.fetch_archive(subpackage, dest, options)),
            };
        tokio::select! {
            outcome = operation => outcome,
            () = wait_cancelled(cancellation) => {
                FetchOutcome::failed(repoutils_core::Error::UserInterrupt)
            }
        }
    }

    async fn fetch_git(
        &self,
        subpackage: &SubpackageRef,
        dest: &Path,
        options: &FetchOptions,
    ) -> FetchOutcome {
        let Some(reference_url) = &subpackage.url else {
            return FetchOutcome::failed(repoutils_core::Error::validation(
                "git subpackage missing remote-url",
                None,
            ));
        };
        let branch = subpackage.git_branch.clone().unwrap_or_else(|| "main".to_string());

        let resolution = self.resolve(reference_url, options).await;
        let already_present = GitBackend::is_repository(dest).await;

        let git_options = GitOptions {
            shallow: options.shallow,
            branch: branch.clone(),
            strict: options.strict,
            recurse_submodules: true,
        };

        match self.git.fetch(&resolution.url, dest, &git_options).await {
            Ok(()) => {
                if !already_present && resolution.url != resolution.official_url {
                    if let Err(err) = self
                        .git
                        .restore_canonical_origin(dest, &resolution.official_url, &resolution.url, &branch)
                        .await
                    {
                        return FetchOutcome::failed(err);
                    }
                }
                if already_present {
                    FetchOutcome::AlreadyPresent
                } else {
                    FetchOutcome::Fetched
                }
            }
            Err(err) => FetchOutcome::failed(err),
        }
    }

    async fn fetch_archive(
        &self,
        subpackage: &SubpackageRef,
        dest: &Path,
        options: &FetchOptions,
    ) -> FetchOutcome {
        let Some(reference_url) = &subpackage.url else {
            return FetchOutcome::failed(repoutils_core::Error::validation(
                "archive subpackage missing remote-url",
                None,
            ));
        };
        let Some(archive_type_raw) = &subpackage.archive_type else {
            return FetchOutcome::failed(repoutils_core::Error::validation(
                "archive subpackage missing archive-type",
                None,
            ));
        };
        let archive_type = match ArchiveType::parse(archive_type_raw) {
            Ok(t) => t,
            Err(err) => return FetchOutcome::failed(err),
        };

        if dest.exists() {
            return FetchOutcome::AlreadyPresent;
        }

        let resolution = self.resolve(reference_url, options).await;
        match self
            .archive
            .fetch(&resolution.url, archive_type, dest, self.overwrite.as_ref())
            .await
        {
            Ok(()) => FetchOutcome::Fetched,
            Err(err) => FetchOutcome::failed(err),
        }
    }

    async fn resolve(&self, reference: &str, options: &FetchOptions) -> Resolution {
        if !options.use_mirror {
            return Resolution {
                url: reference.to_string(),
                official_url: reference.to_string(),
            };
        }
        let Some(mirror) = &self.mirror else {
            return Resolution {
                url: reference.to_string(),
                official_url: reference.to_string(),
            };
        };
        mirror
            .resolve(reference, &options.protocol)
            .await
            .unwrap_or_else(|_| Resolution {
                url: reference.to_string(),
                official_url: reference.to_string(),
            })
    }
}
