//! Progress notification port
//!
//! Defines the interface for reporting progress while an execution streams.

use fleet_domain::{BackendEvent, ExecutionResult};

/// Callback for progress updates during one execution
///
/// Implementations live in the presentation layer (e.g. a terminal spinner).
/// Every method has a no-op default.
pub trait ExecutionProgress: Send + Sync {
    /// Called once before the backend session is opened.
    fn on_start(&self, _label: &str, _timeout_seconds: u64) {}

    /// Called for each backend event, in arrival order.
    fn on_event(&self, _event: &BackendEvent) {}

    /// Called once with the final result.
    fn on_finish(&self, _result: &ExecutionResult) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ExecutionProgress for NoProgress {}
