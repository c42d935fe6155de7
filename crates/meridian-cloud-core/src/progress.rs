//! Progress reporting for composite operations
//!
//! Composite operations can take minutes. The dispatcher emits one event
//! when a wait starts, one per poll, and one when the wait ends, so a CLI
//! can drive a spinner and a server can log progress. Consumers that do
//! not care simply leave the callback unset.

use std::time::Duration;

/// Progress events emitted while waiting for a composite operation
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A wait has begun for `watch_id` (a resource or work request id)
    Started { operation: String, watch_id: String },
    /// One poll completed with the given state label
    Polling {
        operation: String,
        watch_id: String,
        state: String,
        elapsed: Duration,
    },
    /// The wait converged
    Completed {
        operation: String,
        watch_id: String,
        elapsed: Duration,
    },
    /// The wait failed (timeout or fetch failure)
    Failed {
        operation: String,
        watch_id: String,
        error: String,
    },
}

/// Callback type for progress updates
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Helper to emit progress events
pub(crate) fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
