//! An accumulator for composition errors and warnings.
//!
//! Composition keeps walking the config tree (or flow expression) even after
//! it finds a problem, so a single run can report every missing export in
//! one pass instead of forcing a fix-rebuild-refind loop.

use std::sync::Mutex;

use crate::error::{CompositionError, CompositionWarning};

/// Accumulates [`CompositionError`]s and [`CompositionWarning`]s discovered
/// while walking a config tree or a flow expression.
///
/// Cheap to share: push from as many places in the traversal as you like,
/// then drain once at the end.
#[derive(Default)]
pub struct CompositionSink {
    errors: Mutex<Vec<CompositionError>>,
    warnings: Mutex<Vec<CompositionWarning>>,
}

impl CompositionSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fatal composition error.
    pub fn push_error(&self, error: CompositionError) {
        self.errors
            .lock()
            .expect("composition sink mutex was poisoned")
            .push(error);
    }

    /// Record a non-fatal composition warning.
    pub fn push_warning(&self, warning: CompositionWarning) {
        self.warnings
            .lock()
            .expect("composition sink mutex was poisoned")
            .push(warning);
    }

    /// `true` if at least one error has been recorded.
    pub fn has_errored(&self) -> bool {
        !self.errors.lock().expect("composition sink mutex was poisoned").is_empty()
    }

    /// Drain and return every error recorded so far.
    pub fn drain_errors(&self) -> Vec<CompositionError> {
        std::mem::take(&mut *self.errors.lock().expect("composition sink mutex was poisoned"))
    }

    /// Drain and return every warning recorded so far.
    pub fn drain_warnings(&self) -> Vec<CompositionWarning> {
        std::mem::take(&mut *self.warnings.lock().expect("composition sink mutex was poisoned"))
    }
}
