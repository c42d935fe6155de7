//! # meridian-cloud
//!
//! Client for the Meridian Cloud database management REST API.
//!
//! This crate is the transport layer: a [`CloudClient`] owning connection
//! pooling, authentication headers, and transient-failure retry, plus typed
//! models and one handler per resource. Composite operations that submit a
//! mutation and wait for the affected resource to converge live in the
//! companion `meridian-cloud-core` crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use meridian_cloud::CloudClient;
//!
//! # async fn example() -> meridian_cloud::Result<()> {
//! let client = CloudClient::builder()
//!     .base_url("https://api.meridian.dev")
//!     .api_key("key")
//!     .api_secret("secret")
//!     .build()?;
//!
//! let db = client.databases().get("db-123").await?;
//! println!("{} is {}", db.name, db.lifecycle_state);
//! # Ok(())
//! # }
//! ```

pub mod backups;
pub mod client;
pub mod clusters;
pub mod databases;
pub mod error;
pub mod retry;
pub mod work_requests;

pub use backups::BackupHandler;
pub use client::{
    ApiResponse, CloudClient, CloudClientBuilder, REQUEST_ID_HEADER, WORK_REQUEST_ID_HEADER,
};
pub use clusters::ClusterHandler;
pub use databases::DatabaseHandler;
pub use error::{ApiError, Result};
pub use retry::RetryConfig;
pub use work_requests::WorkRequestHandler;
