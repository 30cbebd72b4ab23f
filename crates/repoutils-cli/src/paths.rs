//! Per-workspace hidden directory and the global/user/workspace mirrorlist
//! file triad (spec §6, grounded on
//! `original_source/repoutils/config.py`'s `GLOBAL_CONFIG_DIR`/
//! `USER_CONFIG_DIR`/`WORKSPACE_LIB_DIR` constants).

use std::path::{Path, PathBuf};

const WORKSPACE_DIR_NAME: &str = ".repoutils";
const MIRRORLIST_FILE_NAME: &str = "mirrorlist.json";

/// System-wide configuration directory (`/etc/repoutils` on Unix).
#[must_use]
pub fn global_config_dir() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\ProgramData\repoutils")
    } else {
        PathBuf::from("/etc/repoutils")
    }
}

/// Per-user configuration directory (`~/.config/repoutils` on Unix,
/// `%LOCALAPPDATA%\repoutils` on Windows).
#[must_use]
pub fn user_config_dir() -> PathBuf {
    if let Ok(local_appdata) = std::env::var("LOCALAPPDATA") {
        return PathBuf::from(local_appdata).join("repoutils");
    }
    PathBuf::from(repoutils_core::platform::home_dir())
        .join(".config")
        .join("repoutils")
}

/// The hidden per-workspace directory (`.repoutils`) beneath `project_root`,
/// holding the merged config cache, log file, and extension state.
#[must_use]
pub fn workspace_dir(project_root: &Path) -> PathBuf {
    project_root.join(WORKSPACE_DIR_NAME)
}

/// The three layered mirrorlist file paths, in global/user/workspace merge
/// order.
#[must_use]
pub fn mirrorlist_paths(project_root: &Path) -> Vec<PathBuf> {
    vec![
        global_config_dir().join(MIRRORLIST_FILE_NAME),
        user_config_dir().join(MIRRORLIST_FILE_NAME),
        workspace_dir(project_root).join(MIRRORLIST_FILE_NAME),
    ]
}
