use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::project::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    operation_id = "createProject",
    summary = "Create a project",
    description = "Creates a project owned by the caller. `description` defaults to an empty string.",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(owner = %auth_user.identity.subject_id))]
pub async fn create_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let model = state
        .coordinator
        .create_project(&auth_user.identity, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(ProjectResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    operation_id = "listProjects",
    summary = "List the caller's projects",
    description = "Returns every project owned by the caller, newest first.",
    responses(
        (status = 200, description = "Project list", body = ProjectListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner = %auth_user.identity.subject_id))]
pub async fn list_projects(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProjectListResponse>, AppError> {
    let projects = state.coordinator.list_projects(&auth_user.identity).await?;
    Ok(Json(projects.into()))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Projects",
    operation_id = "getProject",
    summary = "Get a project with file contents",
    description = "Returns the project and the content of each of its files. Files whose \
        content is missing from storage are left out of `files` and listed in `missing_files`.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project detail", body = ProjectDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(project_id = id))]
pub async fn get_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectDetailResponse>, AppError> {
    let detail = state
        .coordinator
        .project_detail(&auth_user.identity, id)
        .await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    patch,
    path = "/projects/{id}",
    tag = "Projects",
    operation_id = "updateProject",
    summary = "Update a project",
    description = "Updates the name and/or description. Omitted fields are left unchanged.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(project_id = id))]
pub async fn update_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, AppError> {
    let model = state
        .coordinator
        .update_project(&auth_user.identity, id, payload.into())
        .await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "Projects",
    operation_id = "deleteProject",
    summary = "Delete a project and its files",
    description = "Removes every file's content from storage, then deletes the file rows and the \
        project in one transaction. Content that could not be removed is listed in `blob_errors`; \
        the project is deleted regardless.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted", body = DeleteProjectResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(project_id = id))]
pub async fn delete_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteProjectResponse>, AppError> {
    let deletion = state
        .coordinator
        .delete_project(&auth_user.identity, id)
        .await?;
    Ok(Json(deletion.into()))
}
