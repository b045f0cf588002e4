use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::coordinator::{BlobDeletionError, FileContent, FileDeletion};
use crate::entity::file;

/// Response DTO for a file's metadata.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileResponse {
    /// File ID (UUIDv7).
    #[schema(example = "0192a1b2-0000-7000-8000-000000000001")]
    pub id: String,
    #[schema(example = 7)]
    pub project_id: i32,
    #[schema(example = "main.py")]
    pub file_name: String,
    /// Object key of the file's content.
    #[schema(example = "projects/7/files/0192a1b2-0000-7000-8000-000000000001/main.py")]
    pub storage_path: String,
    #[schema(example = "text/x-python")]
    pub content_type: Option<String>,
    /// Content size in bytes.
    #[schema(example = 42)]
    pub size: i64,
    /// SHA-256 of the content.
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<file::Model> for FileResponse {
    fn from(model: file::Model) -> Self {
        Self {
            id: model.id.to_string(),
            project_id: model.project_id,
            file_name: model.file_name,
            storage_path: model.storage_path,
            content_type: model.content_type,
            size: model.size,
            content_hash: model.content_hash,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub total: u64,
}

impl From<Vec<file::Model>> for FileListResponse {
    fn from(models: Vec<file::Model>) -> Self {
        let total = models.len() as u64;
        Self {
            files: models.into_iter().map(FileResponse::from).collect(),
            total,
        }
    }
}

/// A file entry inside a project detail.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileContentResponse {
    pub id: String,
    pub file_name: String,
    /// Content decoded as UTF-8; invalid sequences become U+FFFD.
    #[schema(example = "print('hello')")]
    pub content: String,
}

impl From<FileContent> for FileContentResponse {
    fn from(fc: FileContent) -> Self {
        Self {
            id: fc.file.id.to_string(),
            file_name: fc.file.file_name,
            content: String::from_utf8_lossy(&fc.content).into_owned(),
        }
    }
}

/// A file's metadata together with its content.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileDetailResponse {
    pub file: FileResponse,
    pub content: String,
}

impl From<FileContent> for FileDetailResponse {
    fn from(fc: FileContent) -> Self {
        let content = String::from_utf8_lossy(&fc.content).into_owned();
        Self {
            file: fc.file.into(),
            content,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteFileResponse {
    pub success: bool,
    /// Set when the row was removed but the content blob could not be.
    pub orphaned_blob: Option<BlobDeletionError>,
}

impl From<FileDeletion> for DeleteFileResponse {
    fn from(deletion: FileDeletion) -> Self {
        Self {
            success: true,
            orphaned_blob: deletion.orphaned_blob,
        }
    }
}
