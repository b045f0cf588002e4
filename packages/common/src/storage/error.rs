use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during blob storage operations.
///
/// Every store call surfaces exactly one of these or success; a write that
/// fails never leaves a partially written object visible under its path.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No blob exists at the requested path.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The path is not an acceptable object key.
    #[error("invalid blob path: {0}")]
    InvalidPath(String),

    /// The blob exceeds the configured size limit.
    #[error("blob exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },

    #[error("storage IO error: {0}")]
    Io(#[from] io::Error),

    /// The object store failed the request or could not be reached.
    /// Retrying later may succeed.
    #[error("object store error: {0}")]
    Backend(String),

    /// The object store refused the request or is misconfigured
    /// (access denied, bad credentials, unknown bucket).
    #[error("object store rejected request: {0}")]
    Permanent(String),

    /// The call did not complete within its deadline. The outcome on the
    /// remote side is unknown and must be treated as a failure.
    #[error("object store call timed out after {0:?}")]
    Timeout(Duration),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Backend(_) | Self::Timeout(_) => true,
            Self::Io(err) => !matches!(
                err.kind(),
                io::ErrorKind::PermissionDenied
                    | io::ErrorKind::ReadOnlyFilesystem
                    | io::ErrorKind::InvalidInput
                    | io::ErrorKind::Unsupported
            ),
            Self::NotFound(_)
            | Self::InvalidPath(_)
            | Self::SizeLimitExceeded { .. }
            | Self::Permanent(_) => false,
        }
    }
}
