//! Cluster resources and operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::{ApiResponse, CloudClient};
use crate::error::Result;

/// A managed database cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub project_id: String,
    /// Lifecycle label, e.g. "CREATING", "ACTIVE", "UPDATING", "DELETED"
    pub lifecycle_state: String,
    pub node_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
}

/// Request body for creating a cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCreateRequest {
    pub name: String,
    pub project_id: String,
    pub node_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_shape: Option<String>,
}

impl ClusterCreateRequest {
    #[must_use]
    pub fn new(name: impl Into<String>, project_id: impl Into<String>, node_count: u32) -> Self {
        Self {
            name: name.into(),
            project_id: project_id.into(),
            node_count,
            node_shape: None,
        }
    }

    #[must_use]
    pub fn with_node_shape(mut self, shape: impl Into<String>) -> Self {
        self.node_shape = Some(shape.into());
        self
    }
}

/// Request body for scaling a cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterScaleRequest {
    pub node_count: u32,
}

#[derive(Deserialize)]
struct ClusterList {
    clusters: Vec<Cluster>,
}

/// Handler for cluster operations
pub struct ClusterHandler {
    client: CloudClient,
}

impl ClusterHandler {
    pub fn new(client: CloudClient) -> Self {
        Self { client }
    }

    /// Fetch a cluster by id
    pub async fn get(&self, id: &str) -> Result<Cluster> {
        self.client.get(&format!("/v1/clusters/{id}")).await
    }

    /// List all clusters visible to the account
    pub async fn list(&self) -> Result<Vec<Cluster>> {
        let list: ClusterList = self.client.get("/v1/clusters").await?;
        Ok(list.clusters)
    }

    /// Create a cluster
    pub async fn create(&self, request: &ClusterCreateRequest) -> Result<ApiResponse<Cluster>> {
        self.client.post("/v1/clusters", request).await
    }

    /// Change the cluster's node count
    pub async fn scale(
        &self,
        id: &str,
        request: &ClusterScaleRequest,
    ) -> Result<ApiResponse<Cluster>> {
        self.client
            .post(&format!("/v1/clusters/{id}/actions/scale"), request)
            .await
    }

    /// Delete a cluster
    pub async fn delete(&self, id: &str) -> Result<ApiResponse<()>> {
        self.client.delete(&format!("/v1/clusters/{id}")).await
    }
}
