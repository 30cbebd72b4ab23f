//! Per-ref and aggregate fetch outcomes (spec §4.6, data model).

use repoutils_core::Kind;

/// The result of attempting to fetch one subpackage.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The backend ran and placed the subpackage at its destination.
    Fetched,
    /// The destination already held a checkout and a non-strict
    /// update was applied (or, for virtual refs, nothing was needed).
    AlreadyPresent,
    /// This ref's identity key was already in the `loaded` set; no backend
    /// ran.
    DuplicateSkipped,
    /// The backend failed; siblings still proceed.
    Failed {
        /// The error-taxonomy kind, for exit-code mapping upstream.
        kind: Kind,
        /// Human-readable context.
        message: String,
    },
}

impl FetchOutcome {
    /// Build a `Failed` outcome from any error convertible to the shared
    /// taxonomy.
    #[must_use]
    pub fn failed(err: impl Into<repoutils_core::Error>) -> Self {
        let err = err.into();
        Self::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Whether this outcome counts as a failure for aggregate purposes.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-run totals across every subpackage encountered, including recursive
/// descendants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregates {
    /// Count of `Fetched` outcomes.
    pub fetched: usize,
    /// Count of `AlreadyPresent` outcomes.
    pub already_present: usize,
    /// Count of `DuplicateSkipped` outcomes.
    pub duplicates: usize,
    /// Count of `Failed` outcomes.
    pub failed: usize,
}

impl Aggregates {
    /// Fold one outcome into the running totals.
    pub fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Fetched => self.fetched += 1,
            FetchOutcome::AlreadyPresent => self.already_present += 1,
            FetchOutcome::DuplicateSkipped => self.duplicates += 1,
            FetchOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Total outcomes recorded.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.fetched + self.already_present + self.duplicates + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_tally_each_variant() {
        let mut agg = Aggregates::default();
        agg.record(&FetchOutcome::Fetched);
        agg.record(&FetchOutcome::AlreadyPresent);
        agg.record(&FetchOutcome::DuplicateSkipped);
        agg.record(&FetchOutcome::Failed {
            kind: Kind::Network,
            message: "timeout".into(),
        });
        assert_eq!(agg.total(), 4);
        assert_eq!(agg.fetched, 1);
        assert_eq!(agg.failed, 1);
    }
}
