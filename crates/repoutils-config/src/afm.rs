//! The auto-formatting map: an ordered keyed container whose string leaves
//! are template-expanded on read.

use indexmap::IndexMap;
use repoutils_core::{Value, VariableStore};
use std::collections::HashMap;

use crate::error::{ConfigError, Result};

/// An ordered `string -> Value` container. Reading a string leaf expands it
/// through the owning [`VariableStore`]; reading a list or map leaf returns
/// an `Afm`-wrapped view over the corresponding slice.
///
/// `Afm` does not override generic map indexing (spec §9 design note):
/// expansion is only visible through [`Afm::get`] and [`Afm::get_as`].
#[derive(Debug, Clone)]
pub struct Afm {
    data: IndexMap<String, Value>,
    variables: VariableStore,
}

/// The type assertion failed for [`Afm::get_as`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// String scalar.
    String,
    /// Numeric scalar.
    Number,
    /// Boolean scalar.
    Bool,
    /// List.
    List,
    /// Nested map.
    Map,
}

impl Afm {
    /// Wrap an already-ordered map and the variable store used to expand
    /// string leaves on read.
    #[must_use]
    pub fn new(data: IndexMap<String, Value>, variables: VariableStore) -> Self {
        Self { data, variables }
    }

    /// An empty AFM backed by `variables`.
    #[must_use]
    pub fn empty(variables: VariableStore) -> Self {
        Self {
            data: IndexMap::new(),
            variables,
        }
    }

    /// Convert an unstructured decoded document tree into an AFM, wrapping
    /// nested maps and list-of-map elements recursively.
    #[must_use]
    pub fn from_plain(value: Value, variables: VariableStore) -> Self {
        match value {
            Value::Map(data) => Self { data, variables },
            _ => Self::empty(variables),
        }
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether there are no top-level keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate top-level keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    fn expand(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.variables.format(s, None)),
            Value::List(items) => Value::List(items.iter().map(|v| self.expand(v)).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.expand(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Read `key`, expanding string leaves through the variable store.
    /// Returns `None` when the key is absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.get(key).map(|v| self.expand(v))
    }

    /// Read `key`, falling back to `default` when absent.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Read `key` as a nested [`Afm`] view, or an empty AFM when absent or
    /// not a map.
    #[must_use]
    pub fn get_map(&self, key: &str) -> Self {
        match self.get(key) {
            Some(Value::Map(data)) => Self {
                data,
                variables: self.variables.clone(),
            },
            _ => Self::empty(self.variables.clone()),
        }
    }

    /// Read `key` as a string, returning a [`ConfigError::Validation`] if
    /// absent or of the wrong type.
    pub fn get_string(&self, key: &str) -> Result<String> {
        match self.get(key) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(ConfigError::type_mismatch(key, ValueType::String)),
            None => Err(ConfigError::missing_key(key)),
        }
    }

    /// Read `key` as a string, with a default when the key is absent.
    #[must_use]
    pub fn get_string_or(&self, key: &str, default: impl Into<String>) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s,
            _ => default.into(),
        }
    }

    /// Read `key` as a bool, with a default when absent or wrong type.
    #[must_use]
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => b,
            _ => default,
        }
    }

    /// Read `key` as a list of strings. Per the spec's open question, a bare
    /// string is normalized to a one-element list.
    #[must_use]
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::List(items)) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) => vec![s],
            _ => Vec::new(),
        }
    }

    /// Read `key` as a list of nested maps, each wrapped as an `Afm`.
    #[must_use]
    pub fn get_map_list(&self, key: &str) -> Vec<Self> {
        match self.get(key) {
            Some(Value::List(items)) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::Map(data) => Some(Self {
                        data,
                        variables: self.variables.clone(),
                    }),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Set `key` at the top level, overwriting any existing value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Shallow replace: every key in `other` overwrites the corresponding
    /// key in `self` (top level only; unlike [`Afm::merge`] this does not
    /// recurse into nested maps).
    pub fn update(&mut self, other: &Self) {
        for (k, v) in &other.data {
            self.data.insert(k.clone(), v.clone());
        }
    }

    /// Recursive merge: nested maps merge recursively, lists concatenate,
    /// scalars are overridden by `other` (last-writer-wins).
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let merged = Value::Map(self.data).merge(Value::Map(other.data));
        let Value::Map(data) = merged else {
            unreachable!("merging two maps always yields a map")
        };
        Self {
            data,
            variables: self.variables,
        }
    }

    /// The variable store backing this AFM's expansion.
    #[must_use]
    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Snapshot every top-level key/value with expansion applied, for
    /// callers that want a plain `HashMap` (e.g. workflow step params).
    #[must_use]
    pub fn to_expanded_map(&self) -> HashMap<String, Value> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), self.expand(v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn afm(json_value: serde_json::Value) -> Afm {
        Afm::from_plain(Value::from_json(json_value), VariableStore::new())
    }

    #[test]
    fn get_expands_string_leaves() {
        let vars = VariableStore::new();
        vars.push("name", "repoutils");
        let a = Afm::from_plain(
            Value::from_json(json!({"path": "{name}/src"})),
            vars,
        );
        assert_eq!(a.get_string("path").unwrap(), "repoutils/src");
    }

    #[test]
    fn missing_key_is_validation_error() {
        let a = afm(json!({}));
        assert!(a.get_string("name").is_err());
    }

    #[test]
    fn type_mismatch_is_validation_error() {
        let a = afm(json!({"name": 5}));
        assert!(a.get_string("name").is_err());
    }

    #[test]
    fn update_is_shallow() {
        let mut a = afm(json!({"outer": {"a": 1}}));
        let b = afm(json!({"outer": {"b": 2}}));
        a.update(&b);
        let outer = a.get_map("outer");
        assert!(outer.get("a").is_none());
        assert!(outer.get("b").is_some());
    }

    #[test]
    fn merge_recurses_into_nested_maps() {
        let a = afm(json!({"outer": {"a": 1}}));
        let b = afm(json!({"outer": {"b": 2}}));
        let merged = a.merge(b);
        let outer = merged.get_map("outer");
        assert!(outer.get("a").is_some());
        assert!(outer.get("b").is_some());
    }

    #[test]
    fn string_list_normalizes_bare_string() {
        let a = afm(json!({"path": "one"}));
        assert_eq!(a.get_string_list("path"), vec!["one".to_string()]);
    }
}
