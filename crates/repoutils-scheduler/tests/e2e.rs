//! End-to-end scheduler scenarios: recursive two-level fetch, diamond
//! dependency dedup, and mid-run interrupt.

use repoutils_config::{Afm, ProjectConfig};
use repoutils_core::{CancellationToken, Kind, Value, VariableStore};
use repoutils_scheduler::{Dispatcher, FetchOptions, FetchOutcome, Scheduler};
use repoutils_test_utils::git_utils::TempGitRepo;
use repoutils_test_utils::mock_server::{create_tar_gz_with_file, MockArchiveServer};
use serde_json::json;

fn root_project(root_dir: &std::path::Path, value: serde_json::Value) -> ProjectConfig {
    let afm = Afm::from_plain(Value::from_json(value), VariableStore::new());
    ProjectConfig::from_afm(afm, root_dir.join("repo.json")).unwrap()
}

#[tokio::test]
async fn two_level_fetch_discovers_and_fetches_nested_subpackages() {
    let archive_server = MockArchiveServer::start().await;
    let bytes = create_tar_gz_with_file("hello.txt", b"hi").await.unwrap();
    archive_server.register_archive("/widgets.tar.gz", &bytes, "application/gzip").await;
    let archive_url = format!("{}/widgets.tar.gz", archive_server.url());

    let level1_repo_json = serde_json::to_string_pretty(&json!({
        "name": "level1",
        "version": "1.0.0",
        "subpackages": [
            {"path": "vendor/archived", "type": "archive", "remote-url": archive_url, "archive-type": "tar.gz"},
            {"path": "vendor/virt", "type": "virtual"},
        ]
    }))
    .unwrap();
    let level1 = TempGitRepo::with_content(&[("repo.json", level1_repo_json.as_str())])
        .await
        .unwrap();

    let workspace = tempfile::tempdir().unwrap();
    let project = root_project(
        workspace.path(),
        json!({
            "name": "root",
            "version": "1.0.0",
            "subpackages": [
                {"path": "vendor/level1", "type": "git", "remote-url": level1.path().to_string_lossy(), "git-branch": "main"},
            ]
        }),
    );

    let dispatcher = Dispatcher::new(None).unwrap();
    let scheduler = Scheduler::new(dispatcher);
    let cancellation = CancellationToken::new();
    let (outcomes, aggregates) = scheduler
        .run(&project, &FetchOptions::default(), VariableStore::new(), &cancellation)
        .await
        .unwrap();

    assert_eq!(aggregates.total(), 3);
    assert_eq!(aggregates.fetched, 3);
    assert_eq!(aggregates.failed, 0);
    assert!(outcomes.values().all(|o| matches!(o, FetchOutcome::Fetched)));

    assert!(workspace.path().join("vendor/level1/.git").exists());
    assert!(workspace.path().join("vendor/level1/vendor/archived/hello.txt").exists());
}

#[tokio::test]
async fn diamond_subpackages_sharing_a_url_clone_exactly_once() {
    let shared = TempGitRepo::repo_package("widgets", "1.0.0").await.unwrap();

    let workspace = tempfile::tempdir().unwrap();
    let project = root_project(
        workspace.path(),
        json!({
            "name": "root",
            "version": "1.0.0",
            "subpackages": [
                {"path": "vendor/a", "type": "git", "remote-url": shared.path().to_string_lossy(), "git-branch": "main"},
                {"path": "vendor/b", "type": "git", "remote-url": shared.path().to_string_lossy(), "git-branch": "main"},
            ]
        }),
    );

    let dispatcher = Dispatcher::new(None).unwrap();
    let scheduler = Scheduler::new(dispatcher);
    let cancellation = CancellationToken::new();
    let (outcomes, aggregates) = scheduler
        .run(&project, &FetchOptions::default(), VariableStore::new(), &cancellation)
        .await
        .unwrap();

    // Both subpackages resolve to the same identity key (the shared URL,
    // since neither destination exists yet when the key is computed), so
    // they collide under one entry in the outcomes map; the aggregate
    // totals still count both attempts independently.
    assert_eq!(outcomes.len(), 1);
    assert_eq!(aggregates.total(), 2);
    assert_eq!(aggregates.fetched, 1);
    assert_eq!(aggregates.duplicates, 1);

    // Only one of the two destinations was actually cloned into; the
    // second was skipped before dispatch ever saw it.
    let a_exists = workspace.path().join("vendor/a/.git").exists();
    let b_exists = workspace.path().join("vendor/b/.git").exists();
    assert!(a_exists ^ b_exists, "exactly one of vendor/a or vendor/b should be cloned");
}

#[tokio::test]
async fn cancelling_mid_run_surfaces_user_interrupt_failures() {
    let repo_a = TempGitRepo::repo_package("a", "1.0.0").await.unwrap();
    let repo_b = TempGitRepo::repo_package("b", "1.0.0").await.unwrap();

    let workspace = tempfile::tempdir().unwrap();
    let project = root_project(
        workspace.path(),
        json!({
            "name": "root",
            "version": "1.0.0",
            "subpackages": [
                {"path": "vendor/a", "type": "git", "remote-url": repo_a.path().to_string_lossy(), "git-branch": "main"},
                {"path": "vendor/b", "type": "git", "remote-url": repo_b.path().to_string_lossy(), "git-branch": "main"},
            ]
        }),
    );

    let dispatcher = Dispatcher::new(None).unwrap();
    let scheduler = Scheduler::new(dispatcher);
    let cancellation = CancellationToken::new();
    // Cancelled before the run starts: every fetch should short-circuit
    // into a `UserInterrupt`-kind failure instead of running git at all.
    cancellation.cancel();

    let (outcomes, aggregates) = scheduler
        .run(&project, &FetchOptions::default(), VariableStore::new(), &cancellation)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(aggregates.fetched, 0);
    assert_eq!(aggregates.failed, 2);
    for outcome in outcomes.values() {
        match outcome {
            FetchOutcome::Failed { kind, .. } => assert_eq!(*kind, Kind::UserInterrupt),
            other => panic!("expected a UserInterrupt failure, got {other:?}"),
        }
    }
    assert!(!workspace.path().join("vendor/a/.git").exists());
    assert!(!workspace.path().join("vendor/b/.git").exists());
}
