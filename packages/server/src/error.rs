use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hopekcc_common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Seconds suggested to clients before retrying after `STORAGE_UNAVAILABLE`.
const STORAGE_RETRY_AFTER_SECS: u64 = 5;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `PERMISSION_DENIED`, `NOT_FOUND`, `BLOB_NOT_FOUND`,
    /// `STORAGE_UNAVAILABLE`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Project name must be 1-255 characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Malformed input, rejected before any store is touched.
    Validation(String),
    TokenMissing,
    TokenInvalid,
    /// Authenticated, but not the owner of the target project.
    PermissionDenied,
    /// Metadata row absent.
    NotFound(String),
    /// Metadata row present but its content blob is missing.
    BlobNotFound(String),
    /// Object store failed or timed out. Safe for the caller to retry.
    StorageUnavailable(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "You do not own this project".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::BlobNotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "BLOB_NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::StorageUnavailable(detail) => {
                tracing::warn!("Storage unavailable: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody {
                        code: "STORAGE_UNAVAILABLE",
                        message: "File storage is temporarily unavailable".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = matches!(self, AppError::StorageUnavailable(_));

        let (status, body) = self.status_and_body();

        if retryable {
            (
                status,
                [("Retry-After", STORAGE_RETRY_AFTER_SECS.to_string())],
                Json(body),
            )
                .into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => {
                AppError::BlobNotFound("File content not found in storage".into())
            }
            StorageError::InvalidPath(msg) => AppError::Validation(msg),
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("File exceeds maximum size of {limit} bytes"))
            }
            other if other.is_transient() => AppError::StorageUnavailable(other.to_string()),
            other => AppError::Internal(format!("Blob store refused request: {other}")),
        }
    }
}
