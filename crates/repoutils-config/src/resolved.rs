//! The flattened, typed settings view consumed by the scheduler and mirror
//! resolver, generalized from the teacher's `ResolvedConfig`/
//! `ConfigLoader::resolve` layering (`libretto-config/src/loader.rs`) down
//! to the handful of knobs this tool actually exposes.

use repoutils_core::Value;

use crate::afm::Afm;

/// Default per-probe mirror reachability timeout, in milliseconds.
pub const DEFAULT_RESOLVER_TIMEOUT_MS: u64 = 15_000;

/// Settings read from a `resolver` section of a loaded config file, with
/// built-in defaults for anything absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Per-probe mirror reachability timeout, in milliseconds.
    pub resolver_timeout_ms: u64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            resolver_timeout_ms: DEFAULT_RESOLVER_TIMEOUT_MS,
        }
    }
}

impl ResolvedConfig {
    /// Read `resolver.timeout_ms` from `afm`, falling back to
    /// [`DEFAULT_RESOLVER_TIMEOUT_MS`] when the section or key is absent or
    /// not a number.
    #[must_use]
    pub fn from_afm(afm: &Afm) -> Self {
        let resolver_timeout_ms = match afm.get_map("resolver").get("timeout_ms") {
            Some(Value::Number(n)) if n > 0.0 => n as u64,
            _ => DEFAULT_RESOLVER_TIMEOUT_MS,
        };
        Self { resolver_timeout_ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoutils_core::VariableStore;
    use serde_json::json;

    #[test]
    fn defaults_to_fifteen_seconds() {
        let afm = Afm::empty(VariableStore::new());
        assert_eq!(ResolvedConfig::from_afm(&afm).resolver_timeout_ms, DEFAULT_RESOLVER_TIMEOUT_MS);
    }

    #[test]
    fn honors_an_explicit_override() {
        let afm = Afm::from_plain(
            Value::from_json(json!({"resolver": {"timeout_ms": 5000}})),
            VariableStore::new(),
        );
        assert_eq!(ResolvedConfig::from_afm(&afm).resolver_timeout_ms, 5000);
    }

    #[test]
    fn ignores_a_non_numeric_override() {
        let afm = Afm::from_plain(
            Value::from_json(json!({"resolver": {"timeout_ms": "fast"}})),
            VariableStore::new(),
        );
        assert_eq!(ResolvedConfig::from_afm(&afm).resolver_timeout_ms, DEFAULT_RESOLVER_TIMEOUT_MS);
    }
}
