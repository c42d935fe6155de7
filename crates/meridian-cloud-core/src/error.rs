//! Unified error handling for composite operations
//!
//! The taxonomy separates three failure phases so callers can branch on
//! them: the mutation itself failed (nothing happened, nothing to report),
//! a poll could not even check the state, or the state never converged
//! within budget. The latter two always carry the mutation's
//! [`OperationResult`] as a partial result, so the caller keeps the id of
//! whatever was actually changed.

use std::time::Duration;

use thiserror::Error;

use meridian_cloud::ApiError;

use crate::composite::OperationResult;
use crate::config::ConfigError;

/// Failure inside the polling loop
#[derive(Error, Debug)]
pub enum WaitError {
    /// The target states were never reached within the total ceiling.
    /// The resource is probably still converging; check again later.
    #[error("wait timed out after {waited:?}")]
    Timeout { waited: Duration },

    /// A poll attempt could not fetch the watched state at all
    #[error("fetch failed while waiting: {0}")]
    Fetch(#[from] ApiError),
}

impl WaitError {
    /// Returns true if the wait ran out of budget (as opposed to a fetch
    /// failure)
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

/// A wait failure carrying what the preceding mutation(s) already did
///
/// The mutation succeeded; only the wait for convergence failed. The
/// partial results are never discarded, so the caller can recover the
/// mutated resource's identifier and resume watching it.
#[derive(Error, Debug)]
#[error("operation submitted but waiting failed: {source}")]
pub struct CompositeError {
    /// Results of the mutating calls issued before the wait failed
    pub partial_results: Vec<OperationResult>,
    #[source]
    pub source: WaitError,
}

/// Error type for composite operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// The mutating call itself failed; no partial results exist
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The mutation succeeded but waiting for convergence failed
    #[error(transparent)]
    Wait(#[from] CompositeError),

    /// A wait was requested for a work-request-tracked operation, but the
    /// client was built without work request tracking
    #[error("work request tracking is not available on this client")]
    WorkRequestsUnavailable,

    /// The mutation response carried no work request id to wait on
    #[error("no work request id in the mutation response")]
    MissingWorkRequestId,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for composite operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns true if this is a wait timeout ("still converging") rather
    /// than a failed call
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            CoreError::Wait(CompositeError {
                source: WaitError::Timeout { .. },
                ..
            })
        )
    }

    /// Returns true if the underlying API reported "not found"
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_not_found(),
            CoreError::Wait(CompositeError {
                source: WaitError::Fetch(e),
                ..
            }) => e.is_not_found(),
            _ => false,
        }
    }

    /// Partial results from the mutating calls, if any were issued before
    /// the failure. Empty for mutation-phase errors.
    #[must_use]
    pub fn partial_results(&self) -> &[OperationResult] {
        match self {
            CoreError::Wait(CompositeError {
                partial_results, ..
            }) => partial_results,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(id: &str) -> OperationResult {
        OperationResult {
            resource_id: Some(id.to_string()),
            work_request_id: None,
            payload: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_timeout_classification() {
        let err = CoreError::Wait(CompositeError {
            partial_results: vec![partial("db-1")],
            source: WaitError::Timeout {
                waited: Duration::from_secs(600),
            },
        });

        assert!(err.is_timeout());
        assert!(!err.is_not_found());
        assert_eq!(err.partial_results().len(), 1);
    }

    #[test]
    fn test_mutation_errors_have_no_partial_results() {
        let err = CoreError::Api(ApiError::BadRequest {
            message: "invalid name".into(),
        });

        assert!(!err.is_timeout());
        assert!(err.partial_results().is_empty());
    }

    #[test]
    fn test_fetch_errors_keep_partial_results_and_classification() {
        let err = CoreError::Wait(CompositeError {
            partial_results: vec![partial("db-2")],
            source: WaitError::Fetch(ApiError::NotFound {
                message: "gone".into(),
            }),
        });

        assert!(!err.is_timeout());
        assert!(err.is_not_found());
        assert_eq!(
            err.partial_results()[0].resource_id.as_deref(),
            Some("db-2")
        );
    }

    #[test]
    fn test_display_distinguishes_timeout() {
        let err = CoreError::Wait(CompositeError {
            partial_results: vec![],
            source: WaitError::Timeout {
                waited: Duration::from_secs(60),
            },
        });
        assert!(err.to_string().contains("timed out"));
    }
}
