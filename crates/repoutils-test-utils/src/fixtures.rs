//! Pre-built test fixtures for common testing scenarios.
//!
//! This module provides static fixtures modeling real-world multi-component
//! project layouts: a root project with git/archive/virtual subpackages,
//! mirrorlist files, and hook workflow definitions.

use serde_json::{Value, json};

/// Collection of pre-built test fixtures.
#[derive(Debug)]
pub struct Fixtures;

impl Fixtures {
    /// Empty project file with minimal required fields.
    #[must_use]
    pub fn empty_project_json() -> Value {
        json!({
            "name": "test-project",
            "version": "1.0.0",
            "subpackages": []
        })
    }

    /// A project with a single git subpackage.
    #[must_use]
    pub fn single_git_subpackage_json(remote_url: &str) -> Value {
        json!({
            "name": "test-project",
            "version": "1.0.0",
            "subpackages": [
                {
                    "name": "widgets",
                    "path": "vendor/widgets",
                    "type": "git",
                    "remote-url": remote_url,
                    "git-branch": "main"
                }
            ]
        })
    }

    /// A project with a single archive subpackage.
    #[must_use]
    pub fn single_archive_subpackage_json(remote_url: &str, archive_type: &str) -> Value {
        json!({
            "name": "test-project",
            "version": "1.0.0",
            "subpackages": [
                {
                    "name": "docs",
                    "path": "vendor/docs",
                    "type": "archive",
                    "remote-url": remote_url,
                    "archive-type": archive_type
                }
            ]
        })
    }

    /// A project with a virtual (no-op) subpackage.
    #[must_use]
    pub fn virtual_subpackage_json() -> Value {
        json!({
            "name": "test-project",
            "version": "1.0.0",
            "subpackages": [
                {
                    "name": "placeholder",
                    "path": "vendor/placeholder",
                    "type": "virtual",
                    "description": "provisioned out of band"
                }
            ]
        })
    }

    /// Two subpackages pointing at the same URL, for diamond-dependency
    /// dedup testing.
    #[must_use]
    pub fn diamond_subpackages_json(remote_url: &str) -> Value {
        json!({
            "name": "test-project",
            "version": "1.0.0",
            "subpackages": [
                {
                    "name": "left",
                    "path": "vendor/left",
                    "type": "git",
                    "remote-url": remote_url,
                    "git-branch": "main"
                },
                {
                    "name": "right",
                    "path": "vendor/right",
                    "type": "git",
                    "remote-url": remote_url,
                    "git-branch": "main"
                }
            ]
        })
    }

    /// A project declaring a `post-fetch` hook with a single `log` step.
    #[must_use]
    pub fn project_with_post_fetch_hook_json() -> Value {
        json!({
            "name": "test-project",
            "version": "1.0.0",
            "subpackages": [],
            "hooks": {
                "post-fetch": {
                    "name": "post fetch",
                    "steps": [
                        {
                            "id": "announce",
                            "kind": "log",
                            "message": "fetch complete"
                        }
                    ]
                }
            }
        })
    }

    /// Mirrorlist file content for one host/protocol pair.
    #[must_use]
    pub fn mirrorlist_json(host: &str, protocol: &str, mirrors: &[(&str, &str)]) -> Value {
        let mut entries = serde_json::Map::new();
        for (name, template) in mirrors {
            entries.insert((*name).to_string(), json!(template));
        }
        json!({
            host: {
                protocol: Value::Object(entries)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_project_has_no_subpackages() {
        let json = Fixtures::empty_project_json();
        assert_eq!(json["name"], "test-project");
        assert!(json["subpackages"].as_array().unwrap().is_empty());
    }

    #[test]
    fn single_git_subpackage_has_remote_url() {
        let json = Fixtures::single_git_subpackage_json("https://example.test/widgets.git");
        let sub = &json["subpackages"][0];
        assert_eq!(sub["type"], "git");
        assert_eq!(sub["remote-url"], "https://example.test/widgets.git");
    }

    #[test]
    fn diamond_subpackages_share_a_url() {
        let json = Fixtures::diamond_subpackages_json("https://example.test/shared.git");
        let subs = json["subpackages"].as_array().unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0]["remote-url"], subs[1]["remote-url"]);
    }

    #[test]
    fn mirrorlist_json_nests_by_host_then_protocol() {
        let json = Fixtures::mirrorlist_json("github", "http", &[("official", "https://github.com/{user}/{repo}.git")]);
        assert_eq!(
            json["github"]["http"]["official"],
            "https://github.com/{user}/{repo}.git"
        );
    }
}
