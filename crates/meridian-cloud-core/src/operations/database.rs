//! Composite database operations

use meridian_cloud::databases::{
    Database, DatabaseCreateRequest, DatabaseMoveRequest, DatabaseUpdateRequest,
};
use meridian_cloud::work_requests::WorkRequest;

use crate::composite::{CompositeClient, OperationDescriptor, Outcome, WatchMode};
use crate::error::Result;
use crate::waiter::WaitOptions;

impl CompositeClient {
    /// Create a database, optionally waiting for it to reach a target
    /// state.
    ///
    /// With an empty target set the raw creation result is returned
    /// without a single extra fetch. Otherwise the new database's own
    /// state is polled until it matches, e.g.:
    ///
    /// ```rust,no_run
    /// # use meridian_cloud::databases::DatabaseCreateRequest;
    /// # use meridian_cloud_core::{CompositeClient, WaitOptions};
    /// # async fn example(composites: CompositeClient) -> meridian_cloud_core::Result<()> {
    /// let request = DatabaseCreateRequest::new("orders", "proj-1").with_storage_gb(50);
    /// let outcome = composites
    ///     .create_database(&request, &WaitOptions::for_states(["AVAILABLE"]))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_database(
        &self,
        request: &DatabaseCreateRequest,
        options: &WaitOptions,
    ) -> Result<Outcome<Database>> {
        const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
            name: "database.create",
            mode: WatchMode::Resource,
        };

        let handler = self.client().databases();
        let response = handler.create(request).await?;
        let id = response.body.id.clone();
        let fetch = || handler.get(&id);
        self.wait_on_resource(DESCRIPTOR, response, id.clone(), fetch, options)
            .await
    }

    /// Update a database, optionally waiting for it to settle back into a
    /// target state.
    pub async fn update_database(
        &self,
        id: &str,
        request: &DatabaseUpdateRequest,
        options: &WaitOptions,
    ) -> Result<Outcome<Database>> {
        const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
            name: "database.update",
            mode: WatchMode::Resource,
        };

        let handler = self.client().databases();
        let response = handler.update(id, request).await?;
        let fetch = || handler.get(id);
        self.wait_on_resource(DESCRIPTOR, response, id.to_string(), fetch, options)
            .await
    }

    /// Start a stopped database
    pub async fn start_database(
        &self,
        id: &str,
        options: &WaitOptions,
    ) -> Result<Outcome<Database>> {
        const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
            name: "database.start",
            mode: WatchMode::Resource,
        };

        let handler = self.client().databases();
        let response = handler.start(id).await?;
        let fetch = || handler.get(id);
        self.wait_on_resource(DESCRIPTOR, response, id.to_string(), fetch, options)
            .await
    }

    /// Stop a running database
    pub async fn stop_database(
        &self,
        id: &str,
        options: &WaitOptions,
    ) -> Result<Outcome<Database>> {
        const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
            name: "database.stop",
            mode: WatchMode::Resource,
        };

        let handler = self.client().databases();
        let response = handler.stop(id).await?;
        let fetch = || handler.get(id);
        self.wait_on_resource(DESCRIPTOR, response, id.to_string(), fetch, options)
            .await
    }

    /// Delete a database, optionally waiting for it to terminate.
    ///
    /// The database's state is snapshotted before the delete is issued;
    /// once the wait is running, a not-found read satisfies it, since the
    /// resource disappearing is exactly what is being waited for.
    pub async fn delete_database(
        &self,
        id: &str,
        options: &WaitOptions,
    ) -> Result<Outcome<Database>> {
        const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
            name: "database.delete",
            mode: WatchMode::Resource,
        };

        let handler = self.client().databases();
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

    /// Move a database to another project, optionally waiting on the work
    /// request that tracks the move.
    ///
    /// The watched id is taken from the mutation response's work request
    /// header; the database body is never polled. On convergence the
    /// outcome's snapshot is the final work request.
    pub async fn move_database(
        &self,
        id: &str,
        request: &DatabaseMoveRequest,
        options: &WaitOptions,
    ) -> Result<Outcome<WorkRequest>> {
        const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
            name: "database.move",
            mode: WatchMode::WorkRequest,
        };

        let response = self.client().databases().move_to_project(id, request).await?;
        self.wait_on_work_request(DESCRIPTOR, response, Some(id.to_string()), options)
            .await
    }
}
