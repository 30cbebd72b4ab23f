//! The mirror registry: `host -> protocol -> mirror name -> URL template`,
//! loaded from layered global/user/workspace files (spec §4.4).

use std::path::PathBuf;

use repoutils_config::{Afm, Loader};
use repoutils_core::VariableStore;

use crate::error::{MirrorError, Result};

/// An immutable, process-wide table of mirror URL templates.
#[derive(Debug, Clone)]
pub struct MirrorRegistry {
    afm: Afm,
}

impl MirrorRegistry {
    /// Load and merge the registry from `paths` in order (global, user,
    /// workspace); a missing file is silently skipped, a malformed one is
    /// logged and skipped so one bad layer does not take the whole registry
    /// down.
    #[must_use]
    pub fn from_files(paths: &[PathBuf], variables: VariableStore) -> Self {
        let loader = Loader::new(variables.clone());
        let mut merged = Afm::empty(variables);
        for path in paths {
            if !path.is_file() {
                continue;
            }
            match loader.load(path) {
                Ok(afm) => merged = merged.merge(afm),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to load mirrorlist file");
                }
            }
        }
        Self { afm: merged }
    }

    /// Wrap an already-built AFM (useful for tests and in-process registries).
    #[must_use]
    pub fn from_afm(afm: Afm) -> Self {
        Self { afm }
    }

    /// All `mirror name -> URL template` entries for `host`/`protocol`, in
    /// declaration order. Empty if the host or protocol is not registered.
    #[must_use]
    pub fn mirrors_for(&self, host: &str, protocol: &str) -> Vec<(String, String)> {
        let protocol_map = self.afm.get_map(host).get_map(protocol);
        protocol_map
            .keys()
            .map(str::to_string)
            .filter_map(|name| {
                protocol_map
                    .get_string(&name)
                    .ok()
                    .map(|template| (name, template))
            })
            .collect()
    }

    /// The `official` template for `host`/`protocol`.
    pub fn official_template(&self, host: &str, protocol: &str) -> Result<String> {
        self.afm
            .get_map(host)
            .get_map(protocol)
            .get_string("official")
            .map_err(|_| MirrorError::MissingOfficial {
                host: host.to_string(),
                protocol: protocol.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoutils_core::Value;
    use serde_json::json;

    fn registry() -> MirrorRegistry {
        let afm = Afm::from_plain(
            Value::from_json(json!({
                "github": {
                    "http": {
                        "official": "https://github.com/{user}/{repo}.git",
                        "fast-mirror": "https://mirror.example.org/{user}/{repo}.git"
                    }
                }
            })),
            VariableStore::new(),
        );
        MirrorRegistry::from_afm(afm)
    }

    #[test]
    fn lists_mirrors_for_known_host() {
        let reg = registry();
        let mirrors = reg.mirrors_for("github", "http");
        assert_eq!(mirrors.len(), 2);
    }

    #[test]
    fn unknown_host_has_no_mirrors() {
        let reg = registry();
        assert!(reg.mirrors_for("gitlab", "http").is_empty());
    }

    #[test]
    fn official_template_resolves() {
        let reg = registry();
        assert_eq!(
            reg.official_template("github", "http").unwrap(),
            "https://github.com/{user}/{repo}.git"
        );
    }

    #[test]
    fn missing_official_is_an_error() {
        let afm = Afm::from_plain(
            Value::from_json(json!({"github": {"http": {"only-mirror": "x"}}})),
            VariableStore::new(),
        );
        let reg = MirrorRegistry::from_afm(afm);
        assert!(reg.official_template("github", "http").is_err());
    }
}
