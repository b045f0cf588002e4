use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coordinator::{BlobDeletionError, NewProject, ProjectChanges, ProjectDeletion, ProjectDetail};
use crate::entity::project;
use crate::error::AppError;
use crate::extractors::json::Validate;
use crate::models::file::FileContentResponse;

const MAX_NAME_CHARS: usize = 255;
const MAX_DESCRIPTION_CHARS: usize = 10_000;

/// Validate a trimmed project name (1-255 Unicode characters).
pub fn validate_project_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(
            "Project name must be 1-255 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), AppError> {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(AppError::Validation(
            "Description must be at most 10000 characters".into(),
        ));
    }
    Ok(())
}

/// Request body for creating a project.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProjectRequest {
    #[schema(example = "Turtle graphics")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "Drawing shapes with Python's turtle module")]
    pub description: String,
}

impl Validate for CreateProjectRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_project_name(&self.name)?;
        validate_description(&self.description)
    }
}

impl From<CreateProjectRequest> for NewProject {
    fn from(req: CreateProjectRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            description: req.description,
        }
    }
}

/// Request body for updating a project. Omitted fields are left unchanged.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Validate for UpdateProjectRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validate_project_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}

impl From<UpdateProjectRequest> for ProjectChanges {
    fn from(req: UpdateProjectRequest) -> Self {
        Self {
            name: req.name.map(|n| n.trim().to_string()),
            description: req.description,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectResponse {
    #[schema(example = 7)]
    pub id: i32,
    /// Subject id of the owning identity.
    #[schema(example = "auth0|64f1c2")]
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<project::Model> for ProjectResponse {
    fn from(model: project::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectResponse>,
    pub total: u64,
}

impl From<Vec<project::Model>> for ProjectListResponse {
    fn from(models: Vec<project::Model>) -> Self {
        let total = models.len() as u64;
        Self {
            projects: models.into_iter().map(ProjectResponse::from).collect(),
            total,
        }
    }
}

/// A project with the content of every readable file.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectDetailResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub files: Vec<FileContentResponse>,
    /// IDs of files whose content is missing from storage. These are not in `files`.
    pub missing_files: Vec<String>,
}

impl From<ProjectDetail> for ProjectDetailResponse {
    fn from(detail: ProjectDetail) -> Self {
        Self {
            id: detail.project.id,
            name: detail.project.name,
            description: detail.project.description,
            created_at: detail.project.created_at,
            updated_at: detail.project.updated_at,
            files: detail
                .files
                .into_iter()
                .map(FileContentResponse::from)
                .collect(),
            missing_files: detail
                .missing_files
                .into_iter()
                .map(|id| id.to_string())
                .collect(),
        }
    }
}

/// Result of a project delete. Rows are always gone; `blob_errors` lists
/// content that may remain in storage.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteProjectResponse {
    #[schema(example = "Project 7 and 3 related files have been deleted successfully.")]
    pub message: String,
    pub project_id: i32,
    pub deleted_files: u64,
    pub blob_errors: Vec<BlobDeletionError>,
}

impl From<ProjectDeletion> for DeleteProjectResponse {
    fn from(deletion: ProjectDeletion) -> Self {
        let mut message = format!(
            "Project {} and {} related files have been deleted successfully.",
            deletion.project_id, deletion.deleted_files
        );
        if deletion.is_partial() {
            message.push_str(&format!(
                " However, {} file(s) could not be removed from storage.",
                deletion.blob_errors.len()
            ));
        }

        Self {
            message,
            project_id: deletion.project_id,
            deleted_files: deletion.deleted_files,
            blob_errors: deletion.blob_errors,
        }
    }
}
