//! Keeps project/file metadata rows and their content blobs from diverging.
//!
//! Every compound operation is a fixed sequence of metadata and blob calls:
//!
//! * create: blob first, then row; a failed row insert removes the blob.
//! * update: blob first, then row; a failed blob write leaves the row as is.
//! * delete: blob first, then row; the row is removed even when the blob
//!   delete fails, and the orphaned blob is reported.
//! * project delete: every child blob is attempted, then all rows go in one
//!   transaction.
//!
//! There is no cross-store transaction and no locking between requests.
//! Concurrent writers to the same file race independently at each store.

mod files;
mod projects;
mod reconciler;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hopekcc_common::storage::{BlobPath, BlobStore, StorageError};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::auth::Identity;
use crate::entity::{file, project};
use crate::error::AppError;
use crate::metadata;

pub use files::FileChanges;
pub use projects::{NewProject, ProjectChanges};
pub use reconciler::{FileContent, ProjectDetail};

#[derive(Clone)]
pub struct Coordinator {
    db: DatabaseConnection,
    blobs: Arc<dyn BlobStore>,
    blob_timeout: Duration,
}

/// A blob that could not be removed while its metadata row was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct BlobDeletionError {
    pub file_id: Uuid,
    #[schema(example = "main.py")]
    pub file_name: String,
    #[schema(example = "projects/7/files/0192a1b2-0000-7000-8000-000000000001/main.py")]
    pub storage_path: String,
    #[schema(example = "object store call timed out after 10s")]
    pub error: String,
}

impl BlobDeletionError {
    fn new(file: &file::Model, err: &StorageError) -> Self {
        Self {
            file_id: file.id,
            file_name: file.file_name.clone(),
            storage_path: file.storage_path.clone(),
            error: err.to_string(),
        }
    }
}

/// Outcome of deleting a single file. The row is always gone.
#[derive(Debug, Clone)]
pub struct FileDeletion {
    pub file_id: Uuid,
    pub orphaned_blob: Option<BlobDeletionError>,
}

/// Outcome of deleting a project and everything under it.
#[derive(Debug, Clone)]
pub struct ProjectDeletion {
    pub project_id: i32,
    /// File rows removed by the cascade.
    pub deleted_files: u64,
    /// Blobs that may still exist although their rows are gone.
    pub blob_errors: Vec<BlobDeletionError>,
}

impl ProjectDeletion {
    /// The metadata delete succeeded but some blobs could not be removed.
    pub fn is_partial(&self) -> bool {
        !self.blob_errors.is_empty()
    }
}

/// Reject `identity` unless it owns `project`.
///
/// Files are authorized through their owning project, so this is the only
/// ownership check.
pub fn authorize(identity: &Identity, project: &project::Model) -> Result<(), AppError> {
    if project.owner_id == identity.subject_id {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

impl Coordinator {
    pub fn new(db: DatabaseConnection, blobs: Arc<dyn BlobStore>, blob_timeout: Duration) -> Self {
        Self {
            db,
            blobs,
            blob_timeout,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Load a project and check the caller owns it.
    async fn owned_project(
        &self,
        identity: &Identity,
        project_id: i32,
    ) -> Result<project::Model, AppError> {
        let project = metadata::find_project(&self.db, project_id).await?;
        authorize(identity, &project)?;
        Ok(project)
    }

    /// Load a file and its project and check the caller owns the project.
    async fn owned_file(
        &self,
        identity: &Identity,
        file_id: Uuid,
    ) -> Result<(project::Model, file::Model), AppError> {
        let file = metadata::find_file(&self.db, file_id).await?;
        let project = metadata::find_project(&self.db, file.project_id).await?;
        authorize(identity, &project)?;
        Ok((project, file))
    }

    /// Run one blob store call under the configured deadline.
    async fn blob_call<T>(
        &self,
        op: &'static str,
        path: &BlobPath,
        call: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StorageError> {
        match tokio::time::timeout(self.blob_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, %path, timeout = ?self.blob_timeout, "Blob store call timed out");
                Err(StorageError::Timeout(self.blob_timeout))
            }
        }
    }

    async fn put_blob(&self, path: &BlobPath, data: &[u8]) -> Result<(), StorageError> {
        self.blob_call("put", path, self.blobs.put(path, data)).await
    }

    async fn get_blob(&self, path: &BlobPath) -> Result<Vec<u8>, StorageError> {
        self.blob_call("get", path, self.blobs.get(path)).await
    }

    async fn blob_exists(&self, path: &BlobPath) -> Result<bool, StorageError> {
        self.blob_call("exists", path, self.blobs.exists(path)).await
    }

    async fn delete_blob(&self, path: &BlobPath) -> Result<bool, StorageError> {
        self.blob_call("delete", path, self.blobs.delete(path)).await
    }

    /// Delete a file's blob. `Ok(false)` means it was already absent.
    async fn remove_file_blob(&self, file: &file::Model) -> Result<bool, StorageError> {
        let path = stored_path(file)?;
        self.delete_blob(&path).await
    }
}

/// The blob path recorded on a file row.
fn stored_path(file: &file::Model) -> Result<BlobPath, StorageError> {
    BlobPath::parse(file.storage_path.clone())
}
