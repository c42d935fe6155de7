//! Database resources and operations
//!
//! Databases are the primary managed resource. Mutations either act on the
//! database synchronously (the response body carries the updated resource)
//! or spawn a work request, reported through the
//! [`crate::WORK_REQUEST_ID_HEADER`] response header.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::{ApiResponse, CloudClient};
use crate::error::Result;

/// A managed database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub id: String,
    pub name: String,
    /// Project the database belongs to
    pub project_id: String,
    /// Lifecycle label, e.g. "PROVISIONING", "AVAILABLE", "STOPPED",
    /// "TERMINATING", "TERMINATED"
    pub lifecycle_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_gb: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_updated: Option<DateTime<Utc>>,
}

/// Request body for creating a database
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseCreateRequest {
    pub name: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_gb: Option<i64>,
}

impl DatabaseCreateRequest {
    /// Create a request with the required fields
    #[must_use]
    pub fn new(name: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_id: project_id.into(),
            ..Self::default()
        }
    }

    /// Set the database engine, e.g. "postgres"
    #[must_use]
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Set the engine version
    #[must_use]
    pub fn with_engine_version(mut self, version: impl Into<String>) -> Self {
        self.engine_version = Some(version.into());
        self
    }

    /// Set the storage allocation in GB
    #[must_use]
    pub fn with_storage_gb(mut self, storage_gb: i64) -> Self {
        self.storage_gb = Some(storage_gb);
        self
    }
}

/// Request body for updating a database
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_gb: Option<i64>,
}

/// Request body for moving a database to another project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseMoveRequest {
    pub target_project_id: String,
}

#[derive(Deserialize)]
struct DatabaseList {
    databases: Vec<Database>,
}

/// Handler for database operations
pub struct DatabaseHandler {
    client: CloudClient,
}

impl DatabaseHandler {
    pub fn new(client: CloudClient) -> Self {
        Self { client }
    }

    /// Fetch a database by id
    pub async fn get(&self, id: &str) -> Result<Database> {
        self.client.get(&format!("/v1/databases/{id}")).await
    }

    /// List all databases visible to the account
    pub async fn list(&self) -> Result<Vec<Database>> {
        let list: DatabaseList = self.client.get("/v1/databases").await?;
        Ok(list.databases)
    }

    /// Create a database
    pub async fn create(&self, request: &DatabaseCreateRequest) -> Result<ApiResponse<Database>> {
        self.client.post("/v1/databases", request).await
    }

    /// Update a database
    pub async fn update(
        &self,
        id: &str,
        request: &DatabaseUpdateRequest,
    ) -> Result<ApiResponse<Database>> {
        self.client.put(&format!("/v1/databases/{id}"), request).await
    }

    /// Delete a database. The response has no body; the deletion progresses
    /// through the database's own lifecycle state.
    pub async fn delete(&self, id: &str) -> Result<ApiResponse<()>> {
        self.client.delete(&format!("/v1/databases/{id}")).await
    }

    /// Start a stopped database
    pub async fn start(&self, id: &str) -> Result<ApiResponse<Database>> {
        self.client
            .post(&format!("/v1/databases/{id}/actions/start"), &())
            .await
    }

    /// Stop a running database
    pub async fn stop(&self, id: &str) -> Result<ApiResponse<Database>> {
        self.client
            .post(&format!("/v1/databases/{id}/actions/stop"), &())
            .await
    }

    /// Move a database to another project. Tracked through a work request;
    /// the response body is empty.
    pub async fn move_to_project(
        &self,
        id: &str,
        request: &DatabaseMoveRequest,
    ) -> Result<ApiResponse<()>> {
        self.client
            .post_no_content(&format!("/v1/databases/{id}/actions/move"), Some(request))
            .await
    }
}
