use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::coordinator::FileChanges;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::file::*;
use crate::state::AppState;

/// Room for multipart boundaries and the `file_name` field on top of the blob.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn upload_body_limit(max_blob_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_blob_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(MULTIPART_OVERHEAD))
}

/// Fields read from a file upload form.
#[derive(Default)]
struct UploadForm {
    content: Option<Vec<u8>>,
    /// Filename sent with the `file` part.
    upload_name: Option<String>,
    /// Explicit `file_name` field; wins over `upload_name`.
    file_name: Option<String>,
}

impl UploadForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("file") => {
                    form.upload_name = field.file_name().map(str::to_owned);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                    form.content = Some(bytes.to_vec());
                }
                Some("file_name") => {
                    let text = field.text().await.map_err(|e| {
                        AppError::Validation(format!("Failed to read file_name: {e}"))
                    })?;
                    form.file_name = Some(text);
                }
                _ => {} // Ignore unknown fields.
            }
        }

        Ok(form)
    }

    fn name(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.upload_name.as_deref())
    }
}

#[utoipa::path(
    get,
    path = "/projects/{id}/files",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List a project's files",
    description = "Returns file metadata in creation order. File contents are not read.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "File list", body = FileListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<i32>,
) -> Result<Json<FileListResponse>, AppError> {
    let files = state
        .coordinator
        .list_files(&auth_user.identity, project_id)
        .await?;
    Ok(Json(files.into()))
}

#[utoipa::path(
    post,
    path = "/projects/{id}/files",
    tag = "Files",
    operation_id = "createFile",
    summary = "Upload a file to a project",
    description = "Stores the `file` multipart field and records it under the project. \
        An optional `file_name` field overrides the uploaded filename. \
        Content is written to storage before the metadata row; if storage fails no file is recorded.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body(content_type = "multipart/form-data", description = "File upload with optional file_name"),
    responses(
        (status = 201, description = "File created", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Storage unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn create_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = UploadForm::read(&mut multipart).await?;

    let file_name = form
        .name()
        .map(str::to_owned)
        .ok_or_else(|| AppError::Validation("Missing file name".into()))?;
    let content = form
        .content
        .take()
        .ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

    let model = state
        .coordinator
        .create_file(&auth_user.identity, project_id, &file_name, content)
        .await?;

    Ok((StatusCode::CREATED, Json(FileResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get a file with its content",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File detail", body = FileDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND) or content missing (BLOB_NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Storage unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<FileDetailResponse>, AppError> {
    let detail = state
        .coordinator
        .file_detail(&auth_user.identity, file_id)
        .await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    patch,
    path = "/files/{id}",
    tag = "Files",
    operation_id = "updateFile",
    summary = "Replace a file's content and/or rename it",
    description = "Both multipart fields are optional: `file` replaces the content, `file_name` \
        renames the file and moves its content to the matching storage path. \
        Storage is written before the metadata row; if storage fails the file is left unchanged.",
    params(("id" = Uuid, Path, description = "File ID")),
    request_body(content_type = "multipart/form-data", description = "Optional new content and/or file_name"),
    responses(
        (status = 200, description = "File updated", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND) or content missing (BLOB_NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Storage unavailable (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn update_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<FileResponse>, AppError> {
    let form = UploadForm::read(&mut multipart).await?;

    let changes = FileChanges {
        file_name: form.file_name.filter(|n| !n.trim().is_empty()),
        content: form.content,
    };

    let model = state
        .coordinator
        .update_file(&auth_user.identity, file_id, changes)
        .await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Removes the content from storage, then the metadata row. The row is removed \
        even if storage fails; the leftover content is then reported in `orphaned_blob`.",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File deleted", body = DeleteFileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<DeleteFileResponse>, AppError> {
    let deletion = state
        .coordinator
        .delete_file(&auth_user.identity, file_id)
        .await?;
    Ok(Json(deletion.into()))
}
