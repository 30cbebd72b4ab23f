//! The scalar/list/map value union that backs the AFM and workflow params.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// A decoded configuration value: string, number, boolean, list, or nested
/// ordered map. Leaf strings are template-expanded on read by the AFM, never
/// on write — `Value` itself carries no expansion logic.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 string, expanded on read by the owning AFM.
    String(String),
    /// A number, stored as `f64` regardless of whether the source was an
    /// integer or float literal.
    Number(f64),
    /// A boolean.
    Bool(bool),
    /// An ordered list of values.
    List(Vec<Value>),
    /// An ordered nested map.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Convert a decoded JSON document (the common denominator all of the
    /// loader's supported formats get translated to) into a `Value` tree.
    #[must_use]
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::String(String::new()),
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => Self::Number(n.as_f64().unwrap_or(0.0)),
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            JsonValue::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Best-effort string view, used by the template expander. Numbers and
    /// bools are stringified; lists and maps return `None`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// True when this value is a list.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// True when this value is a map.
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Recursive merge: maps merge key-by-key (recursing on shared keys that
    /// are both maps), lists concatenate, everything else is overridden by
    /// `other` (last-writer-wins).
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Map(mut a), Self::Map(b)) => {
                for (k, v) in b {
                    match a.shift_remove(&k) {
                        Some(existing) => {
                            a.insert(k, existing.merge(v));
                        }
                        None => {
                            a.insert(k, v);
                        }
                    }
                }
                Self::Map(a)
            }
            (Self::List(mut a), Self::List(b)) => {
                a.extend(b);
                Self::List(a)
            }
            (_, other) => other,
        }
    }
}
