//! Integration tests for the `repoutils` binary: end-to-end `fetch` runs
//! against local git remotes and archive servers, plus the `post-fetch`
//! hook firing afterward.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use repoutils_test_utils::git_utils::TempGitRepo;

fn repoutils() -> Command {
    Command::cargo_bin("repoutils").expect("failed to find repoutils binary")
}

fn write_project_file(dir: &Path, content: &str) {
    fs::write(dir.join("repo.json"), content).expect("failed to write repo.json");
}

mod fetch_workflow {
    use super::*;

    #[tokio::test]
    async fn fetches_a_single_git_subpackage() {
        let upstream = TempGitRepo::repo_package("widgets", "1.0.0").await.unwrap();
        let workspace = TempDir::new().unwrap();

        write_project_file(
            workspace.path(),
            &format!(
                r#"{{
                    "name": "root",
                    "version": "1.0.0",
                    "subpackages": [
                        {{
                            "path": "vendor/widgets",
                            "type": "git",
                            "remote-url": "{}",
                            "git-branch": "main"
                        }}
                    ]
                }}"#,
                upstream.path().display()
            ),
        );

        repoutils()
            .arg("fetch")
            .arg("-M")
            .current_dir(workspace.path())
            .assert()
            .success();

        assert!(workspace.path().join("vendor/widgets/.git").exists());
        assert!(workspace.path().join("vendor/widgets/repo.json").exists());
    }

    #[tokio::test]
    async fn strict_mode_fails_when_destination_already_has_a_checkout() {
        let upstream = TempGitRepo::repo_package("widgets", "1.0.0").await.unwrap();
        let workspace = TempDir::new().unwrap();

        write_project_file(
            workspace.path(),
            &format!(
                r#"{{
                    "name": "root",
                    "version": "1.0.0",
                    "subpackages": [
                        {{
                            "path": "vendor/widgets",
                            "type": "git",
                            "remote-url": "{}",
                            "git-branch": "main"
                        }}
                    ]
                }}"#,
                upstream.path().display()
            ),
        );

        repoutils()
            .arg("fetch")
            .arg("-M")
            .current_dir(workspace.path())
            .assert()
            .success();

        repoutils()
            .arg("fetch")
            .arg("-M")
            .arg("--strict")
            .current_dir(workspace.path())
            .assert()
            .failure();
    }

    #[tokio::test]
    async fn runs_the_post_fetch_hook_after_a_successful_fetch() {
        let upstream = TempGitRepo::repo_package("widgets", "1.0.0").await.unwrap();
        let workspace = TempDir::new().unwrap();

        write_project_file(
            workspace.path(),
            &format!(
                r#"{{
                    "name": "root",
                    "version": "1.0.0",
                    "subpackages": [
                        {{
                            "path": "vendor/widgets",
                            "type": "git",
                            "remote-url": "{}",
                            "git-branch": "main"
                        }}
                    ],
                    "hooks": {{
                        "post-fetch": {{
                            "steps": [
                                {{"id": "announce", "kind": "log", "message": "fetch finished"}}
                            ]
                        }}
                    }}
                }}"#,
                upstream.path().display()
            ),
        );

        repoutils()
            .arg("-v")
            .arg("fetch")
            .arg("-M")
            .current_dir(workspace.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("fetch finished"));
    }

    #[test]
    fn fails_cleanly_when_no_project_file_is_found() {
        let workspace = TempDir::new().unwrap();

        repoutils()
            .arg("fetch")
            .current_dir(workspace.path())
            .assert()
            .failure();
    }
}
