//! Progress reporting for chunking runs.
//!
//! [`ProgressCallback`] keeps the core independent of any rendering
//! backend. The CLI plugs in an `indicatif` bar; tests and library callers
//! use [`NullProgress`].

/// Receives progress updates from a running [`crate::Chunker`].
pub trait ProgressCallback: Send + Sync {
    /// Set the total number of rows expected (enables percentage/ETA).
    fn set_total(&self, total: u64);

    /// Advance by `delta` rows.
    fn inc(&self, delta: u64);

    /// Update the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Mark the run as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every progress update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
