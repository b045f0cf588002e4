use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "health",
    summary = "Liveness check",
    description = "Returns `ok` when the server is up and the database answers a ping.",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 500, description = "Database unreachable (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.coordinator.db().ping().await?;
    Ok(Json(HealthResponse { status: "ok" }))
}
