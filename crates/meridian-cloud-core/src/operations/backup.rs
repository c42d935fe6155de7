//! Composite backup operations

use meridian_cloud::backups::{Backup, BackupCreateRequest, BackupRestoreRequest};
use meridian_cloud::work_requests::WorkRequest;

use crate::composite::{CompositeClient, OperationDescriptor, Outcome, WatchMode};
use crate::error::Result;
use crate::waiter::WaitOptions;

impl CompositeClient {
    /// Create a backup, optionally waiting for it to become usable
    pub async fn create_backup(
        &self,
        request: &BackupCreateRequest,
        options: &WaitOptions,
    ) -> Result<Outcome<Backup>> {
        const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
            name: "backup.create",
            mode: WatchMode::Resource,
        };

        let handler = self.client().backups();
        let response = handler.create(request).await?;
        let id = response.body.id.clone();
        let fetch = || handler.get(&id);
        self.wait_on_resource(DESCRIPTOR, response, id.clone(), fetch, options)
            .await
    }

    /// Restore a backup into a database, optionally waiting on the work
    /// request that tracks the restore
    pub async fn restore_backup(
        &self,
        id: &str,
        request: &BackupRestoreRequest,
        options: &WaitOptions,
    ) -> Result<Outcome<WorkRequest>> {
        const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
            name: "backup.restore",
            mode: WatchMode::WorkRequest,
        };

        let response = self.client().backups().restore(id, request).await?;
        self.wait_on_work_request(DESCRIPTOR, response, None, options)
            .await
    }

    /// Delete a backup, optionally waiting for it to disappear
    pub async fn delete_backup(&self, id: &str, options: &WaitOptions) -> Result<Outcome<Backup>> {
        const DESCRIPTOR: OperationDescriptor = OperationDescriptor {
            name: "backup.delete",
            mode: WatchMode::Resource,
        };

        let handler = self.client().backups();
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
