//! The composite-operation dispatcher
//!
//! Every mutating API action follows the same shape: submit the mutation
//! once, figure out what to watch (the resource itself, or the work request
//! the response points at), and hand that to the waiter. The per-endpoint
//! methods in [`crate::operations`] are thin wrappers that each declare an
//! [`OperationDescriptor`] and delegate to one of the three generic
//! helpers here, so the polling logic exists exactly once.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;

use meridian_cloud::client::ApiResponse;
use meridian_cloud::work_requests::WorkRequest;
use meridian_cloud::{CloudClient, WorkRequestHandler};

use crate::config::Profile;
use crate::error::{CompositeError, CoreError, Result};
use crate::progress::{ProgressCallback, ProgressEvent, emit};
use crate::waiter::{Converged, StateSnapshot, WaitOptions, wait_until};
use crate::work_requests::WorkRequestWait;

/// Which identifier a composite operation watches after its mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// Poll the mutated resource's own fetch-by-id, using the id from the
    /// response body
    Resource,
    /// Poll the work request named by the mutation response's metadata
    /// header, never the resource body
    WorkRequest,
}

/// Static description of one composite operation
///
/// Each endpoint wrapper declares one of these instead of hand-rolling its
/// own polling; the mode tag and name feed tracing and progress events.
#[derive(Debug, Clone, Copy)]
pub struct OperationDescriptor {
    /// Dotted operation name, e.g. "database.create"
    pub name: &'static str,
    pub mode: WatchMode,
}

/// The outcome of the initial mutating call
///
/// Immutable once produced. Carried inside failure values as a partial
/// result so a failed wait never loses the identifier of what was mutated.
#[derive(Debug, Clone)]
pub struct OperationResult {
    /// Id of the resource the mutation acted on, when known
    pub resource_id: Option<String>,
    /// Id of the work request tracking the mutation, when the endpoint
    /// reports one
    pub work_request_id: Option<String>,
    /// The raw response payload
    pub payload: serde_json::Value,
}

impl OperationResult {
    fn from_response<T: Serialize>(
        response: &ApiResponse<T>,
        resource_id: Option<String>,
    ) -> Self {
        Self {
            resource_id,
            work_request_id: response.work_request_id.clone(),
            payload: serde_json::to_value(&response.body).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// How a composite operation ended
#[derive(Debug)]
pub enum Outcome<T> {
    /// No wait was requested; the raw mutation result, untouched
    Submitted(OperationResult),
    /// The wait converged on a snapshot matching the target states
    Converged {
        result: OperationResult,
        snapshot: T,
    },
    /// A delete-class wait observed the resource disappear
    Removed(OperationResult),
}

impl<T> Outcome<T> {
    /// The mutation result, whatever happened afterwards
    #[must_use]
    pub fn operation_result(&self) -> &OperationResult {
        match self {
            Outcome::Submitted(result)
            | Outcome::Converged { result, .. }
            | Outcome::Removed(result) => result,
        }
    }

    /// The final snapshot, if the wait converged on one
    #[must_use]
    pub fn snapshot(&self) -> Option<&T> {
        match self {
            Outcome::Converged { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    /// Consume the outcome, keeping only the snapshot
    pub fn into_snapshot(self) -> Option<T> {
        match self {
            Outcome::Converged { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }
}

/// How work-request-tracked operations are waited on
///
/// Resolved once at construction instead of probed per call: either the
/// batched waiter utility, or direct polling of the work request endpoint.
pub enum WorkRequestStrategy {
    /// Delegate to a batched waiter; timing options pass through unchanged
    Batched(Arc<dyn WorkRequestWait>),
    /// Poll the work request endpoint with the shared waiter loop
    Direct(WorkRequestHandler),
}

/// Client for composite operations: one mutating call plus an optional
/// wait for the affected resource or work request to converge
///
/// # Example
///
/// ```rust,no_run
/// use meridian_cloud::CloudClient;
/// use meridian_cloud::databases::DatabaseCreateRequest;
/// use meridian_cloud_core::{CompositeClient, WaitOptions};
///
/// # async fn example() -> meridian_cloud_core::Result<()> {
/// # let client = CloudClient::builder().base_url("https://api.meridian.dev").build()?;
/// let composites = CompositeClient::new(client);
///
/// let request = DatabaseCreateRequest::new("orders", "proj-1");
/// let outcome = composites
///     .create_database(&request, &WaitOptions::for_states(["AVAILABLE"]))
///     .await?;
///
/// let db = outcome.into_snapshot().expect("waited, so a snapshot exists");
/// println!("{} is {}", db.name, db.lifecycle_state);
/// # Ok(())
/// # }
/// ```
pub struct CompositeClient {
    client: CloudClient,
    work_requests: Option<WorkRequestStrategy>,
    on_progress: Option<ProgressCallback>,
}

impl CompositeClient {
    /// Create a composite client that polls work requests directly
    pub fn new(client: CloudClient) -> Self {
        Self {
            work_requests: Some(WorkRequestStrategy::Direct(client.work_requests())),
            client,
            on_progress: None,
        }
    }

    /// Create a composite client from a configuration profile
    pub fn from_profile(profile: &Profile) -> Result<Self> {
        Ok(Self::new(profile.client()?))
    }

    /// Builder for non-default work request strategies and progress
    /// reporting
    pub fn builder(client: CloudClient) -> CompositeClientBuilder {
        CompositeClientBuilder {
            composite: Self::new(client),
        }
    }

    /// The underlying API client
    pub fn client(&self) -> &CloudClient {
        &self.client
    }

    /// Resource-identifier mode: the mutation response body carries the
    /// watched resource's id, and the wait polls that resource's own
    /// fetch-by-id.
    pub(crate) async fn wait_on_resource<B, S, F, Fut>(
        &self,
        descriptor: OperationDescriptor,
        response: ApiResponse<B>,
        resource_id: String,
        fetch: F,
        options: &WaitOptions,
    ) -> Result<Outcome<S>>
    where
        B: Serialize,
        S: StateSnapshot,
        F: FnMut() -> Fut,
        Fut: Future<Output = meridian_cloud::Result<S>>,
    {
        let result = OperationResult::from_response(&response, Some(resource_id.clone()));
        if !options.waits() {
            return Ok(Outcome::Submitted(result));
        }
        self.converge(descriptor, &resource_id, fetch, options, false, result)
            .await
    }

    /// Job-identifier mode: the watched id comes from the mutation
    /// response's work request header, and the wait polls the work request,
    /// never the resource body.
    pub(crate) async fn wait_on_work_request<B>(
        &self,
        descriptor: OperationDescriptor,
        response: ApiResponse<B>,
        resource_id: Option<String>,
        options: &WaitOptions,
    ) -> Result<Outcome<WorkRequest>>
    where
        B: Serialize,
    {
        let result = OperationResult::from_response(&response, resource_id);

        // Absence of work request tracking is only an error once a wait is
        // actually requested.
        if !options.waits() {
            return Ok(Outcome::Submitted(result));
        }
        let Some(strategy) = &self.work_requests else {
            return Err(CoreError::WorkRequestsUnavailable);
        };
        let Some(work_request_id) = result.work_request_id.clone() else {
            return Err(CoreError::MissingWorkRequestId);
        };

        match strategy {
            WorkRequestStrategy::Batched(waiter) => {
                let started = Instant::now();
                emit(
                    &self.on_progress,
                    ProgressEvent::Started {
                        operation: descriptor.name.to_string(),
                        watch_id: work_request_id.clone(),
                    },
                );
                match waiter.wait(&work_request_id, options).await {
                    Ok(snapshot) => {
                        emit(
                            &self.on_progress,
                            ProgressEvent::Completed {
                                operation: descriptor.name.to_string(),
                                watch_id: work_request_id,
                                elapsed: started.elapsed(),
                            },
                        );
                        Ok(Outcome::Converged { result, snapshot })
                    }
                    Err(source) => {
                        emit(
                            &self.on_progress,
                            ProgressEvent::Failed {
                                operation: descriptor.name.to_string(),
                                watch_id: work_request_id,
                                error: source.to_string(),
                            },
                        );
                        Err(CompositeError {
                            partial_results: vec![result],
                            source,
                        }
                        .into())
                    }
                }
            }
            WorkRequestStrategy::Direct(handler) => {
                let fetch = || handler.get(&work_request_id);
                self.converge(descriptor, &work_request_id, fetch, options, false, result)
                    .await
            }
        }
    }

    /// Delete-class operations: snapshot the watch target BEFORE the
    /// delete, because the resource may stop existing between the delete
    /// call and the first poll and a deletion response has no body to read
    /// an id from. The pre-fetch/delete order must not be swapped.
    pub(crate) async fn delete_and_wait<B, S, F, Fut, M, MFut>(
        &self,
        descriptor: OperationDescriptor,
        resource_id: String,
        mut fetch: F,
        mutate: M,
        options: &WaitOptions,
    ) -> Result<Outcome<S>>
    where
        B: Serialize,
        S: StateSnapshot,
        F: FnMut() -> Fut,
        Fut: Future<Output = meridian_cloud::Result<S>>,
        M: FnOnce() -> MFut,
        MFut: Future<Output = meridian_cloud::Result<ApiResponse<B>>>,
    {
        if !options.waits() {
            let response = mutate().await?;
            return Ok(Outcome::Submitted(OperationResult::from_response(
                &response,
                Some(resource_id),
            )));
        }

        // Confirm the watch target exists while it still does; afterwards
        // the waiter's first not-found read means the deletion finished.
        let _ = fetch().await?;
        let response = mutate().await?;
        let result = OperationResult::from_response(&response, Some(resource_id.clone()));

        self.converge(descriptor, &resource_id, fetch, options, true, result)
            .await
    }

    /// Run the waiter for one composite operation, emitting progress and
    /// wrapping failures with the mutation's partial result.
    async fn converge<S, F, Fut>(
        &self,
        descriptor: OperationDescriptor,
        watch_id: &str,
        fetch: F,
        options: &WaitOptions,
        succeed_on_not_found: bool,
        result: OperationResult,
    ) -> Result<Outcome<S>>
    where
        S: StateSnapshot,
        F: FnMut() -> Fut,
        Fut: Future<Output = meridian_cloud::Result<S>>,
    {
        let started = Instant::now();
        tracing::debug!(
            operation = descriptor.name,
            mode = ?descriptor.mode,
            watch_id,
            targets = ?options.target_states(),
            "waiting for composite operation"
        );
        emit(
            &self.on_progress,
            ProgressEvent::Started {
                operation: descriptor.name.to_string(),
                watch_id: watch_id.to_string(),
            },
        );

        let on_attempt = |snapshot: &S, elapsed| {
            emit(
                &self.on_progress,
                ProgressEvent::Polling {
                    operation: descriptor.name.to_string(),
                    watch_id: watch_id.to_string(),
                    state: snapshot.state_label().to_string(),
                    elapsed,
                },
            );
        };

        let outcome = wait_until(
            fetch,
            |snapshot: &S| options.matches(snapshot.state_label()),
            options.interval_ceiling,
            options.total_ceiling,
            succeed_on_not_found,
            on_attempt,
        )
        .await;

        match outcome {
            Ok(Converged::Reached(snapshot)) => {
                emit(
                    &self.on_progress,
                    ProgressEvent::Completed {
                        operation: descriptor.name.to_string(),
                        watch_id: watch_id.to_string(),
                        elapsed: started.elapsed(),
                    },
                );
                Ok(Outcome::Converged { result, snapshot })
            }
            Ok(Converged::Gone) => {
                emit(
                    &self.on_progress,
                    ProgressEvent::Completed {
                        operation: descriptor.name.to_string(),
                        watch_id: watch_id.to_string(),
                        elapsed: started.elapsed(),
                    },
                );
                Ok(Outcome::Removed(result))
            }
            Err(source) => {
                tracing::debug!(
                    operation = descriptor.name,
                    watch_id,
                    error = %source,
                    "composite wait failed"
                );
                emit(
                    &self.on_progress,
                    ProgressEvent::Failed {
                        operation: descriptor.name.to_string(),
                        watch_id: watch_id.to_string(),
                        error: source.to_string(),
                    },
                );
                Err(CompositeError {
                    partial_results: vec![result],
                    source,
                }
                .into())
            }
        }
    }
}

/// Builder for [`CompositeClient`]
pub struct CompositeClientBuilder {
    composite: CompositeClient,
}

impl CompositeClientBuilder {
    /// Use a batched work request waiter instead of direct polling
    #[must_use]
    pub fn batched_work_requests(mut self, waiter: impl WorkRequestWait + 'static) -> Self {
        self.composite.work_requests = Some(WorkRequestStrategy::Batched(Arc::new(waiter)));
        self
    }

    /// Disable work request tracking entirely. Work-request-tracked
    /// operations still submit fine; requesting a wait on one becomes
    /// [`CoreError::WorkRequestsUnavailable`].
    #[must_use]
    pub fn without_work_request_tracking(mut self) -> Self {
        self.composite.work_requests = None;
        self
    }

    /// Receive progress events while waits are running
    #[must_use]
    pub fn on_progress(mut self, callback: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.composite.on_progress = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> CompositeClient {
        self.composite
    }
}
