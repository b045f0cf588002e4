//! Read path: merges metadata rows with what the blob store actually holds.

use hopekcc_common::storage::StorageError;
use tracing::warn;
use uuid::Uuid;

use super::{Coordinator, stored_path};
use crate::auth::Identity;
use crate::entity::{file, project};
use crate::error::AppError;
use crate::metadata;

/// A file row together with its stored content.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub file: file::Model,
    pub content: Vec<u8>,
}

/// A project with every file whose content could be read.
#[derive(Debug, Clone)]
pub struct ProjectDetail {
    pub project: project::Model,
    pub files: Vec<FileContent>,
    /// Files that have a row but whose blob is missing or unreadable.
    pub missing_files: Vec<Uuid>,
}

impl Coordinator {
    /// Load a project and the content of each of its files.
    ///
    /// A file whose blob is missing is left out of `files` and listed in
    /// `missing_files`; one bad blob never fails the whole read.
    pub async fn project_detail(
        &self,
        identity: &Identity,
        project_id: i32,
    ) -> Result<ProjectDetail, AppError> {
        let project = self.owned_project(identity, project_id).await?;
        let rows = metadata::list_files_for_project(&self.db, project.id).await?;

        let mut files = Vec::with_capacity(rows.len());
        let mut missing_files = Vec::new();
        for file in rows {
            match self.read_if_present(&file).await {
                Ok(Some(content)) => files.push(FileContent { file, content }),
                Ok(None) => {
                    warn!(
                        project_id = project.id,
                        file_id = %file.id,
                        path = %file.storage_path,
                        "File row has no blob; omitting from project detail"
                    );
                    missing_files.push(file.id);
                }
                Err(err) => {
                    warn!(
                        project_id = project.id,
                        file_id = %file.id,
                        path = %file.storage_path,
                        error = %err,
                        "Could not read blob; omitting from project detail"
                    );
                    missing_files.push(file.id);
                }
            }
        }

        Ok(ProjectDetail {
            project,
            files,
            missing_files,
        })
    }

    /// Load one file with its content.
    ///
    /// A missing row is `NotFound`; a row without a blob is `BlobNotFound`.
    pub async fn file_detail(
        &self,
        identity: &Identity,
        file_id: Uuid,
    ) -> Result<FileContent, AppError> {
        let (_, file) = self.owned_file(identity, file_id).await?;

        match self.read_if_present(&file).await? {
            Some(content) => Ok(FileContent { file, content }),
            None => {
                warn!(file_id = %file.id, path = %file.storage_path, "File content not found in storage");
                Err(AppError::BlobNotFound(
                    "File content not found in storage".into(),
                ))
            }
        }
    }

    /// `Ok(None)` when the blob does not exist, including when it vanishes
    /// between the existence check and the read.
    async fn read_if_present(&self, file: &file::Model) -> Result<Option<Vec<u8>>, StorageError> {
        let path = stored_path(file)?;
        if !self.blob_exists(&path).await? {
            return Ok(None);
        }
        match self.get_blob(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
