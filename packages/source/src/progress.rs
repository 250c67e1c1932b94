//! Progress reporting for long-running loads and extractions.
//!
//! [`ProgressCallback`] keeps the loaders independent of how progress is
//! shown. The CLIs render it with `indicatif`; library callers and tests
//! use [`NullProgress`].

use std::sync::Arc;

/// Receives progress of a unit-counted operation, such as years loaded or
/// files extracted.
pub trait ProgressCallback: Send + Sync {
    /// Sets the total number of units.
    fn set_total(&self, total: u64);

    /// Advances by `delta` units.
    fn inc(&self, delta: u64);

    /// Replaces the message shown next to the progress.
    fn set_message(&self, msg: String);

    /// Marks the operation as complete.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
