//! Work requests
//!
//! Long-running mutations that are not reflected synchronously in a
//! resource's own lifecycle state are tracked through a work request. The
//! id arrives in the mutation response's
//! [`crate::WORK_REQUEST_ID_HEADER`] header; the work request is then
//! polled by id until it reaches a terminal status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::CloudClient;
use crate::error::Result;

/// A trackable long-running operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRequest {
    pub id: String,
    /// What the work request is doing, e.g. "MOVE_DATABASE"
    pub operation_type: String,
    /// Status label: "ACCEPTED", "IN_PROGRESS", "SUCCEEDED", "FAILED",
    /// "CANCELED"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<f32>,
    /// Resources affected by this work request
    #[serde(default)]
    pub resources: Vec<WorkRequestResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_accepted: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_finished: Option<DateTime<Utc>>,
}

/// One resource touched by a work request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRequestResource {
    pub entity_type: String,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkRequestList {
    work_requests: Vec<WorkRequest>,
}

/// Handler for work request lookups
pub struct WorkRequestHandler {
    client: CloudClient,
}

impl WorkRequestHandler {
    pub fn new(client: CloudClient) -> Self {
        Self { client }
    }

    /// Fetch a work request by id
    pub async fn get(&self, id: &str) -> Result<WorkRequest> {
        self.client.get(&format!("/v1/work-requests/{id}")).await
    }

    /// List work requests affecting a resource
    pub async fn list(&self, resource_id: &str) -> Result<Vec<WorkRequest>> {
        let list: WorkRequestList = self
            .client
            .get(&format!("/v1/work-requests?resourceId={resource_id}"))
            .await?;
        Ok(list.work_requests)
    }
}
