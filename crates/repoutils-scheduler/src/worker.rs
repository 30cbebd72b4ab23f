//! Worker pool: dedup by identity key, dispatch, and breadth-first
//! recursion into fetched subpackages that are themselves projects
//! (spec §4.6).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashSet;
use futures::stream::{self, StreamExt};
use repoutils_config::{find_project_file, Loader, ProjectConfig, SubpackageRef};
use repoutils_core::{CancellationToken, VariableStore};

use crate::backend::{Dispatcher, FetchOptions};
use crate::error::{Result, SchedulerError};
use crate::outcome::{Aggregates, FetchOutcome};

struct WorkItem {
    subpackage: SubpackageRef,
    dest: PathBuf,
}

fn identity_key(item: &WorkItem) -> String {
    if item.dest.exists() {
        item.dest.to_string_lossy().into_owned()
    } else {
        item.subpackage
            .url
            .clone()
            .unwrap_or_else(|| item.dest.to_string_lossy().into_owned())
    }
}

/// Walks a project's subpackage list, dispatching backends with bounded
/// concurrency and recursing into fetched subtrees.
pub struct Scheduler {
    dispatcher: Arc<Dispatcher>,
    loaded: DashSet<String>,
    concurrency: usize,
}

impl Scheduler {
    /// Build a scheduler with worker count capped at the host's CPU count.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            loaded: DashSet::new(),
            concurrency: repoutils_core::platform::nproc(),
        }
    }

    /// Fetch every subpackage of `project`, recursing into any fetched
    /// subtree that itself contains a project file. `cancellation` is
    /// checked before each subpackage starts and raced against any already
    /// in-flight backend call; once it fires, unstarted and in-flight
    /// fetches alike surface as `UserInterrupt`-kind failures while
    /// already-completed siblings keep their real outcomes.
    pub async fn run(
        &self,
        project: &ProjectConfig,
        options: &FetchOptions,
        variables: VariableStore,
        cancellation: &CancellationToken,
    ) -> Result<(HashMap<String, FetchOutcome>, Aggregates)> {
        let mut queue = self.initial_queue(project)?;
        let mut outcomes = HashMap::new();
        let mut aggregates = Aggregates::default();

        while !queue.is_empty() {
            let level = std::mem::take(&mut queue);
            let concurrency = self.concurrency.min(level.len()).max(1);

            let processed: Vec<(String, FetchOutcome, Option<PathBuf>)> = stream::iter(level)
                .map(|item| {
                    let dispatcher = Arc::clone(&self.dispatcher);
                    let loaded = &self.loaded;
                    async move {
                        let identity = identity_key(&item);
                        // `insert` reports whether this identity was newly
                        // claimed, so two siblings racing on the same URL
                        // (a diamond dependency) can't both slip past the
                        // check before either records itself.
                        if !loaded.insert(identity.clone()) {
                            return (identity, FetchOutcome::DuplicateSkipped, None);
                        }

                        let outcome = dispatcher
                            .fetch(&item.subpackage, &item.dest, options, cancellation)
                            .await;
                        if outcome.is_failure() {
                            loaded.remove(&identity);
                        }
                        let succeeded = !outcome.is_failure();
                        (identity, outcome, succeeded.then_some(item.dest))
                    }
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;

            for (identity, outcome, fetched_dir) in processed {
                aggregates.record(&outcome);
                outcomes.insert(identity, outcome);

                if let Some(dir) = fetched_dir {
                    if let Some(children) = self.discover_children(&dir, variables.clone()) {
                        for child in children {
                            let dest = dir.join(child.primary_path());
                            queue.push(WorkItem { subpackage: child, dest });
                        }
                    }
                }
            }
        }

        Ok((outcomes, aggregates))
    }

    fn initial_queue(&self, project: &ProjectConfig) -> Result<Vec<WorkItem>> {
        let refs = project.subpackages().map_err(SchedulerError::Config)?;
        Ok(refs
            .into_iter()
            .map(|s| {
                let dest = project.resolve_path(s.primary_path());
                WorkItem { subpackage: s, dest }
            })
            .collect())
    }

    fn discover_children(&self, dir: &Path, variables: VariableStore) -> Option<Vec<SubpackageRef>> {
        let project_file = find_project_file(dir)?;
        let loader = Loader::new(variables);
        let afm = loader.load(&project_file).ok()?;
        let child_project = ProjectConfig::from_afm(afm, &project_file).ok()?;
        child_project.subpackages().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoutils_config::Afm;
    use repoutils_core::Value;
    use serde_json::json;

    fn work_item(url: Option<&str>, dest: PathBuf) -> WorkItem {
        let afm = Afm::from_plain(
            Value::from_json(json!({
                "path": "x",
                "type": "virtual",
            })),
            VariableStore::new(),
        );
        let mut subpackage = SubpackageRef::from_afm(&afm).unwrap();
        subpackage.url = url.map(str::to_string);
        WorkItem { subpackage, dest }
    }

    #[test]
    fn identity_key_prefers_existing_dest_path() {
        let dir = tempfile::tempdir().unwrap();
        let item = work_item(Some("https://example.org/a.git"), dir.path().to_path_buf());
        assert_eq!(identity_key(&item), dir.path().to_string_lossy());
    }

    #[test]
    fn identity_key_falls_back_to_url_when_absent() {
        let item = work_item(
            Some("https://example.org/a.git"),
            PathBuf::from("/does/not/exist"),
        );
        assert_eq!(identity_key(&item), "https://example.org/a.git");
    }
}
