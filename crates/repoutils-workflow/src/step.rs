//! The `Step` trait and a registry mapping `kind` strings to constructors
//! (spec §4.7; generalized from the teacher's `HookRegistry` handler
//! registration to step-kind dispatch).

use std::fmt;

use dashmap::DashMap;
use repoutils_config::Afm;

use crate::error::{Result, WorkflowError};

/// One workflow step. Implementations are constructed bare by their
/// registry entry, then validated and filled in by `init`.
#[async_trait::async_trait]
pub trait Step: Send + Sync {
    /// Validate and extract this step's parameters from its AFM slice.
    /// Called once, immediately after construction, before `run`.
    fn init(&mut self, params: &Afm) -> Result<()>;

    /// Execute the step. Only called after a successful `init`.
    async fn run(&self) -> Result<()>;
}

impl fmt::Debug for dyn Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Step")
    }
}

/// Maps a `kind` string to a fresh, uninitialized step instance.
#[derive(Default)]
pub struct StepRegistry {
    constructors: DashMap<String, fn() -> Box<dyn Step>>,
}

impl StepRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `kind`. A later registration for the
    /// same kind replaces the earlier one.
    pub fn register(&self, kind: impl Into<String>, ctor: fn() -> Box<dyn Step>) {
        self.constructors.insert(kind.into(), ctor);
    }

    /// Construct and initialize a step of the given `kind` from `params`.
    pub fn build(&self, id: &str, kind: &str, params: &Afm) -> Result<Box<dyn Step>> {
        let ctor = self
            .constructors
            .get(kind)
            .ok_or_else(|| WorkflowError::UnknownKind {
                id: id.to_string(),
                kind: kind.to_string(),
            })?;
        let mut step = ctor();
        step.init(params).map_err(|e| WorkflowError::InitFailed {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        Ok(step)
    }

    /// Whether a constructor is registered for `kind`.
    #[must_use]
    pub fn supports(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }
}

/// Writes a message to the tracing log; the simplest possible step, used
/// in tests and as a sentinel for workflows with no side effects wired up
/// yet.
#[derive(Debug, Default)]
pub struct LogStep {
    message: String,
}

#[async_trait::async_trait]
impl Step for LogStep {
    fn init(&mut self, params: &Afm) -> Result<()> {
        self.message = params.get_string("message")?;
        Ok(())
    }

    async fn run(&self) -> Result<()> {
        tracing::info!(message = %self.message, "log step");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoutils_core::{Value, VariableStore};
    use serde_json::json;

    fn afm(value: serde_json::Value) -> Afm {
        Afm::from_plain(Value::from_json(value), VariableStore::new())
    }

    #[test]
    fn unregistered_kind_is_rejected() {
        let registry = StepRegistry::new();
        let err = registry.build("s1", "log", &afm(json!({"message": "hi"})));
        assert!(matches!(err, Err(WorkflowError::UnknownKind { .. })));
    }

    #[test]
    fn registered_kind_builds_and_inits() {
        let registry = StepRegistry::new();
        registry.register("log", || Box::<LogStep>::default());
        let step = registry
            .build("s1", "log", &afm(json!({"message": "hello"})))
            .unwrap();
        assert!(registry.supports("log"));
        drop(step);
    }

    #[test]
    fn init_failure_is_reported() {
        let registry = StepRegistry::new();
        registry.register("log", || Box::<LogStep>::default());
        let err = registry.build("s1", "log", &afm(json!({})));
        assert!(matches!(err, Err(WorkflowError::InitFailed { .. })));
    }
}
