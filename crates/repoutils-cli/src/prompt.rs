//! The interactive UCI overwrite prompt, wiring
//! `repoutils_archive::OverwritePolicy` to stdin (spec §4.5.3's
//! "password/overwrite" design note).

use std::io::Write;
use std::path::Path;

use repoutils_archive::OverwritePolicy;

/// Prompts on stdin/stderr for confirmation before an archive backend
/// overwrites an existing destination.
pub struct StdinOverwritePrompt;

#[async_trait::async_trait]
impl OverwritePolicy for StdinOverwritePrompt {
    async fn confirm_overwrite(&self, path: &Path) -> bool {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            eprint!("{} already exists; overwrite it? [y/N] ", path.display());
            let _ = std::io::stderr().flush();
            let mut answer = String::new();
            if std::io::stdin().read_line(&mut answer).is_err() {
                return false;
            }
            matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}
