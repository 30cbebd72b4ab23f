//! The shared cooperative-cancellation flag used by mirror races (§4.4),
//! the scheduler's worker pool, and the global Ctrl+C handler (§5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable, cheap-to-check flag. Every clone observes the same
/// underlying state. Flipping it is one-directional: once cancelled, a
/// token never un-cancels.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A fresh, not-yet-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
