//! Composite cluster operations

use meridian_cloud::clusters::{Cluster, ClusterCreateRequest, ClusterScaleRequest};

use crate::composite::{CompositeClient, OperationDescriptor, Outcome, WatchMode};
use crate::error::Result;
use crate::waiter::WaitOptions;

impl CompositeClient {
    /// Create a cluster, optionally waiting for it to reach a target state
    pub async fn create_cluster(
        &self,
        request: &ClusterCreateRequest,
        options: &WaitOptions,
    ) -> Result<Outcome<Cluster>> {
        const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
            name: "cluster.create",
            mode: WatchMode::Resource,
        };

        let handler = self.client().clusters();
        let response = handler.create(request).await?;
        let id = response.body.id.clone();
        let fetch = || handler.get(&id);
        self.wait_on_resource(DESCRIPTOR, response, id.clone(), fetch, options)
            .await
    }

    /// Change a cluster's node count, optionally waiting for the scale to
    /// settle
    pub async fn scale_cluster(
        &self,
        id: &str,
        request: &ClusterScaleRequest,
        options: &WaitOptions,
    ) -> Result<Outcome<Cluster>> {
        const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
            name: "cluster.scale",
            mode: WatchMode::Resource,
        };

        let handler = self.client().clusters();
        let response = handler.scale(id, request).await?;
        let fetch = || handler.get(id);
        self.wait_on_resource(DESCRIPTOR, response, id.to_string(), fetch, options)
            .await
    }

    /// Delete a cluster, optionally waiting for it to disappear
    pub async fn delete_cluster(
        &self,
        id: &str,
        options: &WaitOptions,
    ) -> Result<Outcome<Cluster>> {
        const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
            name: "cluster.delete",
            mode: WatchMode::Resource,
        };

        let handler = self.client().clusters();
        let fetch = || handler.get(id);
        self.delete_and_wait(
            DESCRIPTOR,
            id.to_string(),
            fetch,
            || handler.delete(id),
            options,
        )
        .await
    }
}
