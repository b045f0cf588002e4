use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{BlobDeletionError, Coordinator, ProjectDeletion};
use crate::auth::Identity;
use crate::entity::project;
use crate::error::AppError;
use crate::metadata;

/// Fields of a project being created. Already validated.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
}

/// PATCH-style changes to a project. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Coordinator {
    /// Create a project owned by `identity`.
    pub async fn create_project(
        &self,
        identity: &Identity,
        new: NewProject,
    ) -> Result<project::Model, AppError> {
        let now = Utc::now();
        let model = project::ActiveModel {
            owner_id: Set(identity.subject_id.clone()),
            name: Set(new.name),
            description: Set(new.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(project_id = model.id, owner = %model.owner_id, "Project created");
        Ok(model)
    }

    /// Projects owned by `identity`, newest first.
    pub async fn list_projects(&self, identity: &Identity) -> Result<Vec<project::Model>, AppError> {
        Ok(metadata::list_projects_for_owner(&self.db, &identity.subject_id).await?)
    }

    pub async fn update_project(
        &self,
        identity: &Identity,
        project_id: i32,
        changes: ProjectChanges,
    ) -> Result<project::Model, AppError> {
        let existing = self.owned_project(identity, project_id).await?;
        if changes == ProjectChanges::default() {
            return Ok(existing);
        }

        let mut active: project::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }

    /// Delete a project, its files' blobs and all of its rows.
    ///
    /// Every blob is attempted even if earlier ones fail. Blob failures do
    /// not stop the metadata cascade; they are returned in
    /// `ProjectDeletion::blob_errors` instead.
    pub async fn delete_project(
        &self,
        identity: &Identity,
        project_id: i32,
    ) -> Result<ProjectDeletion, AppError> {
        let project = self.owned_project(identity, project_id).await?;
        let files = metadata::list_files_for_project(&self.db, project.id).await?;

        let mut blob_errors = Vec::new();
        for file in &files {
            match self.remove_file_blob(file).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(file_id = %file.id, path = %file.storage_path, "Blob already absent");
                }
                Err(err) => {
                    warn!(
                        project_id = project.id,
                        file_id = %file.id,
                        path = %file.storage_path,
                        error = %err,
                        "Failed to delete blob during project delete; blob may be orphaned"
                    );
                    blob_errors.push(BlobDeletionError::new(file, &err));
                }
            }
        }

        let removed = metadata::delete_project_cascade(&self.db, project.id).await?;
        let listed: HashSet<Uuid> = files.iter().map(|file| file.id).collect();
        for file in removed.iter().filter(|file| !listed.contains(&file.id)) {
            warn!(
                project_id = project.id,
                file_id = %file.id,
                path = %file.storage_path,
                "File row added during project delete"
            );
            if let Err(err) = self.remove_file_blob(file).await {
                warn!(
                    project_id = project.id,
                    file_id = %file.id,
                    error = %err,
                    "Failed to delete late blob during project delete; blob may be orphaned"
                );
                blob_errors.push(BlobDeletionError::new(file, &err));
            }
        }
        let deleted_files = removed.len() as u64;

        info!(
            project_id = project.id,
            deleted_files,
            blob_errors = blob_errors.len(),
            "Project deleted"
        );
        Ok(ProjectDeletion {
            project_id: project.id,
            deleted_files,
            blob_errors,
        })
    }
}
