use chrono::Utc;
use hopekcc_common::storage::{BlobPath, ContentHash};
use sea_orm::{ActiveModelTrait, Set};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{BlobDeletionError, Coordinator, FileDeletion, stored_path};
use crate::auth::Identity;
use crate::entity::file;
use crate::error::AppError;
use crate::metadata;
use crate::utils::filename::validate_file_name;

/// Changes to a file. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct FileChanges {
    pub file_name: Option<String>,
    pub content: Option<Vec<u8>>,
}

fn content_type_for(file_name: &str) -> Option<String> {
    mime_guess::from_path(file_name)
        .first()
        .map(|m| m.to_string())
}

fn size_of(content: &[u8]) -> i64 {
    i64::try_from(content.len()).unwrap_or(i64::MAX)
}

impl Coordinator {
    /// Metadata of a project's files in creation order. Does not touch the blob store.
    pub async fn list_files(
        &self,
        identity: &Identity,
        project_id: i32,
    ) -> Result<Vec<file::Model>, AppError> {
        let project = self.owned_project(identity, project_id).await?;
        Ok(metadata::list_files_for_project(&self.db, project.id).await?)
    }

    /// Upload `content`, then record the file row pointing at it.
    ///
    /// If the upload fails no row is written. If the row insert fails the
    /// uploaded blob is removed on a best-effort basis.
    pub async fn create_file(
        &self,
        identity: &Identity,
        project_id: i32,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<file::Model, AppError> {
        let file_name = validate_file_name(file_name)?.to_string();
        let project = self.owned_project(identity, project_id).await?;

        let file_id = Uuid::now_v7();
        let path = BlobPath::for_file(project.id, file_id, &file_name)?;

        self.put_blob(&path, &content).await.inspect_err(|err| {
            warn!(%path, error = %err, "Blob upload failed; no file row written");
        })?;

        let now = Utc::now();
        let row = file::ActiveModel {
            id: Set(file_id),
            project_id: Set(project.id),
            content_type: Set(content_type_for(&file_name)),
            file_name: Set(file_name),
            storage_path: Set(path.to_string()),
            size: Set(size_of(&content)),
            content_hash: Set(ContentHash::compute(&content).to_hex()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match row.insert(&self.db).await {
            Ok(model) => {
                info!(project_id = project.id, file_id = %model.id, path = %path, "File created");
                Ok(model)
            }
            Err(db_err) => {
                if let Err(cleanup_err) = self.delete_blob(&path).await {
                    warn!(
                        %path,
                        error = %cleanup_err,
                        "Failed to remove blob after file row insert failed; blob is orphaned"
                    );
                }
                Err(AppError::Internal(format!(
                    "File create failed while recording metadata: {db_err}"
                )))
            }
        }
    }

    /// Replace a file's content and/or rename it.
    ///
    /// The blob is written before the row changes. A rename relocates the
    /// blob to the path derived from the new name; the old blob is then
    /// deleted best-effort.
    pub async fn update_file(
        &self,
        identity: &Identity,
        file_id: Uuid,
        changes: FileChanges,
    ) -> Result<file::Model, AppError> {
        let new_name = changes
            .file_name
            .as_deref()
            .map(validate_file_name)
            .transpose()?
            .map(str::to_string);
        let (project, existing) = self.owned_file(identity, file_id).await?;

        let renamed = new_name.filter(|name| *name != existing.file_name);
        if renamed.is_none() && changes.content.is_none() {
            return Ok(existing);
        }

        let old_path = stored_path(&existing)
            .map_err(|e| AppError::Internal(format!("File {} has a bad path: {e}", existing.id)))?;
        let target_path = match &renamed {
            Some(name) => BlobPath::for_file(project.id, existing.id, name)?,
            None => old_path.clone(),
        };
        let relocating = target_path != old_path;

        // A rename without new content carries the current content across.
        let content = match changes.content {
            Some(bytes) => Some(bytes),
            None if relocating => Some(self.get_blob(&old_path).await?),
            None => None,
        };

        if let Some(bytes) = &content {
            self.put_blob(&target_path, bytes).await.inspect_err(|err| {
                warn!(path = %target_path, error = %err, "Blob write failed; file row left unchanged");
            })?;
        }

        let mut active: file::ActiveModel = existing.into();
        if let Some(name) = renamed {
            active.content_type = Set(content_type_for(&name));
            active.file_name = Set(name);
        }
        if let Some(bytes) = &content {
            active.size = Set(size_of(bytes));
            active.content_hash = Set(ContentHash::compute(bytes).to_hex());
        }
        active.storage_path = Set(target_path.to_string());
        active.updated_at = Set(Utc::now());

        let updated = match active.update(&self.db).await {
            Ok(model) => model,
            Err(db_err) => {
                if relocating {
                    if let Err(cleanup_err) = self.delete_blob(&target_path).await {
                        warn!(
                            path = %target_path,
                            error = %cleanup_err,
                            "Failed to remove relocated blob after row update failed; blob is orphaned"
                        );
                    }
                } else {
                    warn!(
                        path = %target_path,
                        "Blob overwritten but file row update failed; row describes previous content"
                    );
                }
                return Err(db_err.into());
            }
        };

        if relocating && let Err(err) = self.delete_blob(&old_path).await {
            warn!(
                path = %old_path,
                error = %err,
                "Failed to delete blob at previous path after rename; blob is orphaned"
            );
        }

        info!(file_id = %updated.id, path = %updated.storage_path, "File updated");
        Ok(updated)
    }

    /// Delete a file's blob, then its row.
    ///
    /// A blob that is already gone counts as deleted. Any other blob failure
    /// is logged and reported as an orphan, and the row is removed anyway.
    pub async fn delete_file(
        &self,
        identity: &Identity,
        file_id: Uuid,
    ) -> Result<FileDeletion, AppError> {
        let (_, file) = self.owned_file(identity, file_id).await?;

        let orphaned_blob = match self.remove_file_blob(&file).await {
            Ok(existed) => {
                if !existed {
                    debug!(file_id = %file.id, path = %file.storage_path, "Blob already absent");
                }
                None
            }
            Err(err) => {
                warn!(
                    file_id = %file.id,
                    path = %file.storage_path,
                    error = %err,
                    "Failed to delete blob; removing file row anyway"
                );
                Some(BlobDeletionError::new(&file, &err))
            }
        };

        metadata::delete_file_row(&self.db, file.id).await?;

        info!(file_id = %file.id, orphaned = orphaned_blob.is_some(), "File deleted");
        Ok(FileDeletion {
            file_id: file.id,
            orphaned_blob,
        })
    }
}
