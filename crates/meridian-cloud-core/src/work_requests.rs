//! Batched work request waiting
//!
//! [`WorkRequestWait`] is the seam for anything that can take a work
//! request id and block until it converges; [`WorkRequestWaiter`] is the
//! provided implementation, built on the same waiter loop as everything
//! else. A [`crate::CompositeClient`] built with a batched waiter routes
//! all work-request-tracked operations through it with timing options
//! passed through unchanged.

use std::time::Duration;

use async_trait::async_trait;

use meridian_cloud::work_requests::WorkRequest;
use meridian_cloud::{ApiError, CloudClient, WorkRequestHandler};

use crate::error::WaitError;
use crate::waiter::{Converged, StateSnapshot, WaitOptions, wait_until};

/// Status labels a work request can never leave
pub const TERMINAL_STATES: [&str; 3] = ["SUCCEEDED", "FAILED", "CANCELED"];

/// Waits on work requests by id
#[async_trait]
pub trait WorkRequestWait: Send + Sync {
    /// Wait until the work request's status matches one of the target
    /// states in `options`, with the engine's timing semantics.
    async fn wait(
        &self,
        work_request_id: &str,
        options: &WaitOptions,
    ) -> std::result::Result<WorkRequest, WaitError>;
}

/// Default work request waiter, polling the work request endpoint
pub struct WorkRequestWaiter {
    handler: WorkRequestHandler,
}

impl WorkRequestWaiter {
    pub fn new(client: CloudClient) -> Self {
        Self {
            handler: client.work_requests(),
        }
    }

    /// Wait until the work request reaches any terminal status.
    ///
    /// Interpreting a FAILED or CANCELED snapshot is left to the caller;
    /// this only waits for the work request to stop moving.
    pub async fn wait_for_terminal(
        &self,
        work_request_id: &str,
        interval_ceiling: Duration,
        total_ceiling: Duration,
    ) -> std::result::Result<WorkRequest, WaitError> {
        let options = WaitOptions::for_states(TERMINAL_STATES)
            .with_interval_ceiling(interval_ceiling)
            .with_total_ceiling(total_ceiling);
        self.wait(work_request_id, &options).await
    }
}

#[async_trait]
impl WorkRequestWait for WorkRequestWaiter {
    async fn wait(
        &self,
        work_request_id: &str,
        options: &WaitOptions,
    ) -> std::result::Result<WorkRequest, WaitError> {
        let outcome = wait_until(
            || self.handler.get(work_request_id),
            |wr: &WorkRequest| options.matches(wr.state_label()),
            options.interval_ceiling,
            options.total_ceiling,
            false,
            |wr: &WorkRequest, elapsed| {
                tracing::debug!(
                    work_request_id,
                    status = wr.state_label(),
                    percent_complete = wr.percent_complete,
                    ?elapsed,
                    "work request polled"
                );
            },
        )
        .await?;

        match outcome {
            Converged::Reached(work_request) => Ok(work_request),
            // unreachable with succeed_on_not_found unset; keep the same
            // shape a raw not-found would have had
            Converged::Gone => Err(WaitError::Fetch(ApiError::NotFound {
                message: format!("work request {work_request_id} disappeared"),
            })),
        }
    }
}
