//! Configuration file loader: decodes one of several textual formats,
//! follows `includes`, merges `<file>.d` fragment directories, and is
//! cycle-safe via an explicit visited set (spec §4.3, §9 design note).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use repoutils_core::{Value, VariableStore};

use crate::afm::Afm;
use crate::error::{ConfigError, Result};

/// Decodes a config file and recursively resolves its `includes` and
/// `<file>.d` fragments into a single merged [`Afm`].
#[derive(Debug, Clone)]
pub struct Loader {
    variables: VariableStore,
}

impl Loader {
    /// Build a loader that expands template strings through `variables`.
    #[must_use]
    pub fn new(variables: VariableStore) -> Self {
        Self { variables }
    }

    /// Load `path`, following includes and `.d` fragments. This is the
    /// entry point callers should use; it starts the visited set fresh.
    pub fn load(&self, path: &Path) -> Result<Afm> {
        let mut visited = HashSet::new();
        self.load_recursive(path, &mut visited)
    }

    fn load_recursive(&self, path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Afm> {
        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        if !visited.insert(absolute.clone()) {
            tracing::warn!(path = %absolute.display(), "circular include detected, skipping");
            return Ok(Afm::empty(self.variables.clone()));
        }

        let mut afm = self.decode_file(path)?;

        let includes = afm.get_string_list("includes");
        for include in includes {
            let include_path = resolve_relative(path, &include);
            let included = self.load_recursive(&include_path, visited)?;
            afm = afm.merge(included);
        }

        let fragment_dir = fragment_dir_for(path);
        if fragment_dir.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(&fragment_dir)
                .map_err(|e| ConfigError::io(&fragment_dir, e))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file())
                .collect();
            entries.sort();
            for fragment in entries {
                let loaded = self.load_recursive(&fragment, visited)?;
                afm = afm.merge(loaded);
            }
        }

        Ok(afm)
    }

    fn decode_file(&self, path: &Path) -> Result<Afm> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let json_value = match extension.as_str() {
            "json" | "json5" => serde_json::from_str::<serde_json::Value>(&content)
                .map_err(|e| ConfigError::decode(path, e.to_string()))?,
            "toml" => {
                let toml_value: toml::Value =
                    toml::from_str(&content).map_err(|e| ConfigError::decode(path, e.to_string()))?;
                toml_to_json(toml_value)
            }
            "yaml" | "yml" => serde_yml::from_str::<serde_json::Value>(&content)
                .map_err(|e| ConfigError::decode(path, e.to_string()))?,
            "ini" | "cfg" => decode_ini(&content),
            _ => return Err(ConfigError::UnknownFormat { path: path.to_path_buf() }),
        };

        Ok(Afm::from_plain(
            Value::from_json(json_value),
            self.variables.clone(),
        ))
    }
}

fn resolve_relative(from_file: &Path, include: &str) -> PathBuf {
    let include_path = PathBuf::from(include);
    if include_path.is_absolute() {
        return include_path;
    }
    from_file
        .parent()
        .map(|dir| dir.join(&include_path))
        .unwrap_or(include_path)
}

fn fragment_dir_for(path: &Path) -> PathBuf {
    let mut fragment = path.as_os_str().to_os_string();
    fragment.push(".d");
    PathBuf::from(fragment)
}

fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(d) => serde_json::Value::String(d.to_string()),
        toml::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(map) => serde_json::Value::Object(
            map.into_iter().map(|(k, v)| (k, toml_to_json(v))).collect(),
        ),
    }
}

/// Two-level `[section] key = value` decoding: everything below the section
/// map is a string, matching a plain INI file's untyped grammar. Further AFM
/// features (template expansion, typed `get_as`) apply on top through
/// `Afm::from_plain`.
fn decode_ini(content: &str) -> serde_json::Value {
    let mut root = serde_json::Map::new();
    let mut section = String::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            section = name.trim().to_string();
            root.entry(section.clone())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_string();
        let value = serde_json::Value::String(value.trim().to_string());
        if section.is_empty() {
            root.insert(key, value);
        } else if let Some(serde_json::Value::Object(section_map)) = root.get_mut(&section) {
            section_map.insert(key, value);
        }
    }

    serde_json::Value::Object(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_plain_json() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "repo.json", r#"{"name": "a", "version": "1.0.0"}"#);
        let loader = Loader::new(VariableStore::new());
        let afm = loader.load(&path).unwrap();
        assert_eq!(afm.get_string("name").unwrap(), "a");
    }

    #[test]
    fn follows_includes_and_merges() {
        let dir = tempdir().unwrap();
        write(dir.path(), "base.json", r#"{"shared": {"a": 1}}"#);
        let path = write(
            dir.path(),
            "repo.json",
            r#"{"name": "a", "version": "1.0.0", "includes": ["base.json"]}"#,
        );
        let loader = Loader::new(VariableStore::new());
        let afm = loader.load(&path).unwrap();
        let shared = afm.get_map("shared");
        assert_eq!(shared.get_string("a"), None); // numeric, get_string would fail
        assert!(shared.get("a").is_some());
    }

    #[test]
    fn include_cycle_terminates() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.json", r#"{"includes": ["b.json"], "tag": "a"}"#);
        write(dir.path(), "b.json", r#"{"includes": ["a.json"], "tag": "b"}"#);
        let loader = Loader::new(VariableStore::new());
        let afm = loader.load(&dir.path().join("a.json")).unwrap();
        assert_eq!(afm.get_string("tag").unwrap(), "a");
    }

    #[test]
    fn merges_dot_d_fragments_after_includes() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "repo.json", r#"{"name": "a", "version": "1.0.0"}"#);
        std::fs::create_dir(dir.path().join("repo.json.d")).unwrap();
        write(
            &dir.path().join("repo.json.d"),
            "extra.json",
            r#"{"description": "from fragment"}"#,
        );
        let loader = Loader::new(VariableStore::new());
        let afm = loader.load(&path).unwrap();
        assert_eq!(afm.get_string("description").unwrap(), "from fragment");
    }

    #[test]
    fn unknown_extension_is_validation_error() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "repo.xml", "<xml/>");
        let loader = Loader::new(VariableStore::new());
        assert!(matches!(
            loader.load(&path),
            Err(ConfigError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn decodes_ini_sections() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "repo.ini", "[section]\nkey = value\n");
        let loader = Loader::new(VariableStore::new());
        let afm = loader.load(&path).unwrap();
        let section = afm.get_map("section");
        assert_eq!(section.get_string("key").unwrap(), "value");
    }
}
