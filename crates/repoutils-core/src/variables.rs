//! Process-wide variable store and `{name}` template expansion.
//!
//! The source this is ported from keeps a module-level mutable dictionary of
//! stacks; here it is an explicit, `Arc`-cloneable handle with documented
//! push/pop discipline rather than a hidden global (spec §9 design note).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::platform;

/// A name was looked up with [`VariableStore::top`] but has no value pushed.
#[derive(Debug, thiserror::Error)]
#[error("undefined variable: {0}")]
pub struct UndefinedVariable(pub String);

#[derive(Debug, Default)]
struct Inner {
    stacks: HashMap<String, Vec<String>>,
}

/// A process-wide, thread-safe mapping from variable name to a non-empty
/// stack of string values. Cloning a `VariableStore` clones the handle, not
/// the data — all clones observe the same pushes/pops.
#[derive(Debug, Clone)]
pub struct VariableStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableStore {
    /// An empty store with no builtin names seeded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// A store seeded with the builtin names the spec calls out: `home`,
    /// `cwd`, `nproc`, `os`, `arch`, plus the UCI-owned styling names
    /// (`red`, `bold`, `reset`, …) pushed empty so a UCI may override them.
    #[must_use]
    pub fn with_builtins(version: &str, argv0: &str) -> Self {
        let store = Self::new();
        store.push("home", platform::home_dir());
        store.push("cwd", platform::cwd());
        store.push("nproc", platform::nproc().to_string());
        store.push("os", platform::os_name().to_string());
        store.push("arch", platform::arch_name().to_string());
        store.push("version", version.to_string());
        store.push("argv0", argv0.to_string());
        for styling in ["red", "green", "yellow", "blue", "bold", "reset"] {
            store.push(styling, String::new());
        }
        store
    }

    /// Push a new value for `name`, shadowing any existing value until
    /// popped.
    pub fn push(&self, name: impl Into<String>, value: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.stacks.entry(name.into()).or_default().push(value.into());
    }

    /// Pop the most recent value for `name`. Returns `None` if `name` has no
    /// values (including if it was never pushed).
    pub fn pop(&self, name: &str) -> Option<String> {
        let mut inner = self.inner.write();
        let popped = inner.stacks.get_mut(name).and_then(Vec::pop);
        if matches!(inner.stacks.get(name), Some(stack) if stack.is_empty()) {
            inner.stacks.remove(name);
        }
        popped
    }

    /// The most recently pushed value for `name`, or an error if the stack
    /// is empty or the name was never pushed.
    pub fn top(&self, name: &str) -> Result<String, UndefinedVariable> {
        self.inner
            .read()
            .stacks
            .get(name)
            .and_then(|stack| stack.last().cloned())
            .ok_or_else(|| UndefinedVariable(name.to_string()))
    }

    /// Scan `input` for `{name}` tokens (and, for the workflow/descriptor
    /// layer's `${{name}}` form) and replace each with the `top` of that
    /// name, or with a matching entry in `overrides` (overrides win over
    /// the global store). Unknown tokens are left in place verbatim so
    /// later expansion passes can still resolve them. Total: never errors.
    #[must_use]
    pub fn format(&self, input: &str, overrides: Option<&HashMap<String, String>>) -> String {
        let mut out = String::with_capacity(input.len());
        let bytes = input.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' && input[i + 1..].starts_with("{{") {
                if let Some(end) = input[i + 3..].find("}}") {
                    let name = &input[i + 3..i + 3 + end];
                    if let Some(value) = self.lookup(name, overrides) {
                        out.push_str(&value);
                        i += 3 + end + 2;
                        continue;
                    }
                }
            } else if bytes[i] == b'{' {
                if let Some(end) = input[i + 1..].find('}') {
                    let name = &input[i + 1..i + 1 + end];
                    if let Some(value) = self.lookup(name, overrides) {
                        out.push_str(&value);
                        i += end + 2;
                        continue;
                    }
                }
            }
            // Fall through: copy one char (unknown token, malformed brace,
            // or plain text) verbatim.
            let ch = input[i..].chars().next().unwrap_or('\u{0}');
            out.push(ch);
            i += ch.len_utf8();
        }
        out
    }

    /// Resolve a bare token `name` against `overrides` then the store's own
    /// top value, or `None` if it's not a simple name or is undefined
    /// anywhere. Shared by both the `{name}` and `${{name}}` token forms.
    fn lookup(&self, name: &str, overrides: Option<&HashMap<String, String>>) -> Option<String> {
        // Reject tokens containing another brace — not a simple name, leave
        // the whole thing alone.
        if name.is_empty() || name.contains('{') || name.contains('}') || name.contains(' ') {
            return None;
        }
        if let Some(value) = overrides.and_then(|o| o.get(name)).cloned() {
            return Some(value);
        }
        self.top(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_top_roundtrip() {
        let store = VariableStore::new();
        store.push("name", "a");
        store.push("name", "b");
        assert_eq!(store.top("name").unwrap(), "b");
        assert_eq!(store.pop("name"), Some("b".to_string()));
        assert_eq!(store.top("name").unwrap(), "a");
    }

    #[test]
    fn top_on_missing_name_is_error() {
        let store = VariableStore::new();
        assert!(store.top("missing").is_err());
    }

    #[test]
    fn format_substitutes_known_tokens() {
        let store = VariableStore::new();
        store.push("project", "repoutils");
        assert_eq!(store.format("{project}/src", None), "repoutils/src");
    }

    #[test]
    fn format_leaves_unknown_tokens_verbatim() {
        let store = VariableStore::new();
        assert_eq!(store.format("{missing}/src", None), "{missing}/src");
    }

    #[test]
    fn format_overrides_win_over_store() {
        let store = VariableStore::new();
        store.push("name", "global");
        let mut overrides = HashMap::new();
        overrides.insert("name".to_string(), "local".to_string());
        assert_eq!(store.format("{name}", Some(&overrides)), "local");
    }

    #[test]
    fn format_is_idempotent() {
        let store = VariableStore::new();
        store.push("name", "repoutils");
        let once = store.format("{name}-final", None);
        let twice = store.format(&once, None);
        assert_eq!(once, twice);
    }

    #[test]
    fn format_is_total_on_non_token_input() {
        let store = VariableStore::new();
        assert_eq!(store.format("plain text", None), "plain text");
    }

    #[test]
    fn format_substitutes_dollar_brace_brace_tokens() {
        let store = VariableStore::new();
        store.push("project.name", "repoutils");
        assert_eq!(store.format("${{project.name}}/src", None), "repoutils/src");
    }

    #[test]
    fn format_dollar_brace_brace_overrides_win_over_store() {
        let store = VariableStore::new();
        store.push("name", "global");
        let mut overrides = HashMap::new();
        overrides.insert("name".to_string(), "local".to_string());
        assert_eq!(store.format("${{name}}", Some(&overrides)), "local");
    }

    #[test]
    fn format_leaves_unknown_dollar_brace_brace_tokens_verbatim() {
        let store = VariableStore::new();
        assert_eq!(store.format("${{missing}}/src", None), "${{missing}}/src");
    }
}
