//! Workflow instantiation and sequential execution (spec §4.7), including
//! the explicit current-workflow stack used to support nested
//! workflows-as-steps instead of relying on the call stack (design note).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use repoutils_config::Afm;

use crate::error::{Result, WorkflowError};
use crate::step::{Step, StepRegistry};

/// Observes workflow execution; the UCI wires this to progress output.
/// Mirrors the probe-observer seam used by the mirror resolver.
pub trait WorkflowObserver: Send + Sync {
    /// Called immediately before a step runs.
    fn pre_step(&self, _workflow: &str, _step_id: &str) {}
    /// Called after a step completes, successfully or not.
    fn post_step(&self, _workflow: &str, _step_id: &str, _outcome: &Result<()>) {}
}

/// An observer that does nothing.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {}

struct StepInstance {
    id: String,
    step: Box<dyn Step>,
}

/// A parsed, ready-to-run workflow: an ordered list of initialized steps.
pub struct Workflow {
    /// Workflow id (the key it was registered under, e.g. the hook name).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    steps: Vec<StepInstance>,
}

/// Tracks the stack of currently-running workflow ids, so nested
/// workflows-as-steps can be supported without relying on Rust's own call
/// stack for that bookkeeping.
#[derive(Clone)]
pub struct WorkflowContext {
    stack: Arc<Mutex<Vec<String>>>,
    observer: Arc<dyn WorkflowObserver>,
}

impl Default for WorkflowContext {
    fn default() -> Self {
        Self::new(Arc::new(NoopObserver))
    }
}

impl WorkflowContext {
    /// Build a context reporting through `observer`.
    #[must_use]
    pub fn new(observer: Arc<dyn WorkflowObserver>) -> Self {
        Self {
            stack: Arc::new(Mutex::new(Vec::new())),
            observer,
        }
    }

    /// The ids of workflows currently executing, outermost first.
    #[must_use]
    pub fn current_stack(&self) -> Vec<String> {
        self.stack.lock().clone()
    }
}

/// Pops the workflow id off the context stack when dropped, so an early
/// return on step failure still leaves the stack balanced.
struct StackGuard {
    stack: Arc<Mutex<Vec<String>>>,
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        self.stack.lock().pop();
    }
}

impl Workflow {
    /// Parse a workflow from its `id`/`name` and an ordered list of step
    /// AFMs, looking up each step's `kind` in `registry`.
    ///
    /// Each step map must carry `id`, `kind`, and optionally `name`; the
    /// rest of the map is passed to the step as its params slice.
    pub fn from_afm(
        id: impl Into<String>,
        name: impl Into<String>,
        step_afms: &[Afm],
        registry: &StepRegistry,
    ) -> Result<Self> {
        let id = id.into();
        let name = name.into();
        let mut steps = Vec::with_capacity(step_afms.len());
        let mut seen_ids = std::collections::HashSet::new();

        for step_afm in step_afms {
            let step_id = step_afm.get_string("id")?;
            let kind = step_afm.get_string("kind")?;
            if !seen_ids.insert(step_id.clone()) {
                return Err(WorkflowError::DuplicateStepId {
                    workflow: name.clone(),
                    id: step_id,
                });
            }
            let step = registry.build(&step_id, &kind, step_afm)?;
            steps.push(StepInstance { id: step_id, step });
        }

        Ok(Self { id, name, steps })
    }

    /// Run every step in order. Pushes this workflow's id onto the
    /// context's current-workflow stack for the duration of the run, and
    /// emits a pre/post event around each step.
    pub async fn run(&self, ctx: &WorkflowContext) -> Result<()> {
        ctx.stack.lock().push(self.id.clone());
        let _guard = StackGuard {
            stack: Arc::clone(&ctx.stack),
        };

        for step in &self.steps {
            ctx.observer.pre_step(&self.name, &step.id);
            let outcome = step.step.run().await.map_err(|e| WorkflowError::StepFailed {
                id: step.id.clone(),
                message: e.to_string(),
            });
            ctx.observer.post_step(&self.name, &step.id, &outcome);
            outcome?;
        }

        Ok(())
    }

    /// Number of steps in this workflow.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether this workflow has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Resolve `ProjectConfig.hooks` (raw AFM slices, kept untyped in
/// `repoutils-config` to avoid a circular dependency on this crate) into
/// named, parsed workflows. The hook's map key is also its workflow id;
/// its AFM may carry a `name` override and must carry a `steps` list.
pub fn workflows_from_hooks(
    hooks: &HashMap<String, Afm>,
    registry: &StepRegistry,
) -> Result<HashMap<String, Workflow>> {
    hooks
        .iter()
        .map(|(key, hook_afm)| {
            let name = hook_afm.get_string_or("name", key.clone());
            let steps = hook_afm.get_map_list("steps");
            let workflow = Workflow::from_afm(key.clone(), name, &steps, registry)?;
            Ok((key.clone(), workflow))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::LogStep;
    use repoutils_core::{Value, VariableStore};
    use serde_json::json;

    fn afm(value: serde_json::Value) -> Afm {
        Afm::from_plain(Value::from_json(value), VariableStore::new())
    }

    fn registry() -> StepRegistry {
        let r = StepRegistry::new();
        r.register("log", || Box::<LogStep>::default());
        r
    }

    #[tokio::test]
    async fn runs_steps_in_order() {
        let steps = vec![
            afm(json!({"id": "a", "kind": "log", "message": "one"})),
            afm(json!({"id": "b", "kind": "log", "message": "two"})),
        ];
        let workflow = Workflow::from_afm("wf", "Workflow", &steps, &registry()).unwrap();
        let ctx = WorkflowContext::default();
        assert!(workflow.run(&ctx).await.is_ok());
        assert_eq!(workflow.len(), 2);
    }

    #[test]
    fn duplicate_step_ids_are_rejected() {
        let steps = vec![
            afm(json!({"id": "a", "kind": "log", "message": "one"})),
            afm(json!({"id": "a", "kind": "log", "message": "two"})),
        ];
        let err = Workflow::from_afm("wf", "Workflow", &steps, &registry());
        assert!(matches!(err, Err(WorkflowError::DuplicateStepId { .. })));
    }

    #[test]
    fn unknown_kind_aborts_parsing() {
        let steps = vec![afm(json!({"id": "a", "kind": "ftp"}))];
        let err = Workflow::from_afm("wf", "Workflow", &steps, &registry());
        assert!(matches!(err, Err(WorkflowError::UnknownKind { .. })));
    }

    #[tokio::test]
    async fn stack_is_balanced_after_run() {
        let steps = vec![afm(json!({"id": "a", "kind": "log", "message": "one"}))];
        let workflow = Workflow::from_afm("wf", "Workflow", &steps, &registry()).unwrap();
        let ctx = WorkflowContext::default();
        workflow.run(&ctx).await.unwrap();
        assert!(ctx.current_stack().is_empty());
    }

    #[test]
    fn hooks_resolve_by_exact_key() {
        let mut hooks = HashMap::new();
        hooks.insert(
            "post-fetch".to_string(),
            afm(json!({
                "steps": [{"id": "a", "kind": "log", "message": "done"}]
            })),
        );
        let resolved = workflows_from_hooks(&hooks, &registry()).unwrap();
        let workflow = resolved.get("post-fetch").unwrap();
        assert_eq!(workflow.id, "post-fetch");
        assert_eq!(workflow.name, "post-fetch");
        assert_eq!(workflow.len(), 1);
    }
}
