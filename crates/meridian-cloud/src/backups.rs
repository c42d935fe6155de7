//! Backup resources and operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::{ApiResponse, CloudClient};
use crate::error::Result;

/// A database backup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub id: String,
    pub database_id: String,
    pub display_name: String,
    /// Lifecycle label, e.g. "CREATING", "ACTIVE", "DELETING", "DELETED"
    pub lifecycle_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
}

/// Request body for creating a backup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupCreateRequest {
    pub database_id: String,
    pub display_name: String,
}

/// Request body for restoring a backup into a database
///
/// Restores are long-running and tracked through a work request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRestoreRequest {
    pub target_database_id: String,
}

#[derive(Deserialize)]
struct BackupList {
    backups: Vec<Backup>,
}

/// Handler for backup operations
pub struct BackupHandler {
    client: CloudClient,
}

impl BackupHandler {
    pub fn new(client: CloudClient) -> Self {
        Self { client }
    }

    /// Fetch a backup by id
    pub async fn get(&self, id: &str) -> Result<Backup> {
        self.client.get(&format!("/v1/backups/{id}")).await
    }

    /// List backups for a database
    pub async fn list(&self, database_id: &str) -> Result<Vec<Backup>> {
        let list: BackupList = self
            .client
            .get(&format!("/v1/backups?databaseId={database_id}"))
            .await?;
        Ok(list.backups)
    }

    /// Create a backup
    pub async fn create(&self, request: &BackupCreateRequest) -> Result<ApiResponse<Backup>> {
        self.client.post("/v1/backups", request).await
    }

    /// Restore a backup into a database. Tracked through a work request;
    /// the response body is empty.
    pub async fn restore(
        &self,
        id: &str,
        request: &BackupRestoreRequest,
    ) -> Result<ApiResponse<()>> {
        self.client
            .post_no_content(&format!("/v1/backups/{id}/actions/restore"), Some(request))
            .await
    }

    /// Delete a backup
    pub async fn delete(&self, id: &str) -> Result<ApiResponse<()>> {
        self.client.delete(&format!("/v1/backups/{id}")).await
    }
}
