//! # meridian-cloud-core
//!
//! Composite operations for the Meridian Cloud database management API:
//! submit a mutation, then wait for the affected resource (or the work
//! request tracking it) to converge on a caller-chosen set of states.
//!
//! The crate is organized around one engine and thin wrappers:
//!
//! - [`waiter`] - the generic convergence loop ([`wait_until`]): fetch,
//!   test a predicate over the state label, back off, repeat, with a fixed
//!   total budget.
//! - [`composite`] - the dispatcher ([`CompositeClient`]): runs one
//!   mutation, decides what to watch (resource id vs work request id), and
//!   wraps wait failures with the mutation's partial result.
//! - [`operations`] - one small wrapper per mutating endpoint.
//! - [`work_requests`] - the batched work request waiter seam.
//! - [`config`] - TOML profiles and environment fallbacks.
//! - [`progress`] - optional per-poll progress events for UIs.
//!
//! # Example
//!
//! ```rust,no_run
//! use meridian_cloud::CloudClient;
//! use meridian_cloud::databases::DatabaseCreateRequest;
//! use meridian_cloud_core::{CompositeClient, WaitOptions};
//!
//! # async fn example() -> meridian_cloud_core::Result<()> {
//! let client = CloudClient::builder()
//!     .base_url("https://api.meridian.dev")
//!     .api_key("key")
//!     .api_secret("secret")
//!     .build()?;
//! let composites = CompositeClient::new(client);
//!
//! let request = DatabaseCreateRequest::new("orders", "proj-1");
//! let outcome = composites
//!     .create_database(&request, &WaitOptions::for_states(["AVAILABLE"]))
//!     .await?;
//!
//! match outcome.into_snapshot() {
//!     Some(db) => println!("{} is {}", db.name, db.lifecycle_state),
//!     None => println!("submitted without waiting"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A timed-out wait is not a lost mutation: the error keeps the original
//! operation result, so the created resource's id stays recoverable via
//! [`CoreError::partial_results`].

pub mod composite;
pub mod config;
pub mod error;
pub mod operations;
pub mod progress;
pub mod waiter;
pub mod work_requests;

pub use composite::{
    CompositeClient, CompositeClientBuilder, OperationDescriptor, OperationResult, Outcome,
    WatchMode, WorkRequestStrategy,
};
pub use config::{Config, ConfigError, Profile};
pub use error::{CompositeError, CoreError, Result, WaitError};
pub use progress::{ProgressCallback, ProgressEvent};
pub use waiter::{
    Converged, DEFAULT_INTERVAL_CEILING, DEFAULT_TOTAL_CEILING, StateSnapshot, WaitOptions,
    wait_until,
};
pub use work_requests::{TERMINAL_STATES, WorkRequestWait, WorkRequestWaiter};
