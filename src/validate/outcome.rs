//! Validation results
//!
//! A mismatch is data, not an error: every check returns an [`Outcome`]
//! carrying the verdict plus one diagnostic line per problem found. Each
//! diagnostic is logged at `error` level as it is recorded.

use std::path::PathBuf;

/// Verdict of a single check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub valid: bool,
    pub diagnostics: Vec<String>,
}

impl Outcome {
    pub fn pass() -> Self {
        Self {
            valid: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        let mut outcome = Self::pass();
        outcome.record(message);
        outcome
    }

    /// Record a diagnostic and mark the outcome invalid
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        self.valid = false;
        self.diagnostics.push(message);
    }

    /// Fold another outcome into this one (logical AND)
    pub fn merge(&mut self, other: Outcome) {
        self.valid &= other.valid;
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Self::pass()
    }
}

impl From<Outcome> for bool {
    fn from(outcome: Outcome) -> Self {
        outcome.valid
    }
}

/// One outcome per item of a batch, plus batch-level diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub results: Vec<Outcome>,
    pub diagnostics: Vec<String>,
}

impl BatchOutcome {
    /// A batch rejected as a whole; no per-item checks ran
    pub fn rejected(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!("{}", message);
        Self {
            results: Vec::new(),
            diagnostics: vec![message],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty() && self.results.iter().all(Outcome::is_valid)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Batch result for one validation file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub batch: BatchOutcome,
}

impl FileOutcome {
    pub fn is_valid(&self) -> bool {
        self.batch.is_valid()
    }
}
