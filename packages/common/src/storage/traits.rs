use async_trait::async_trait;

use super::error::StorageError;
use super::path::BlobPath;

/// Path-addressed object storage for file content.
///
/// Implementations store each blob under exactly the key given by the
/// caller and never rewrite it.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` at `path`, replacing any existing blob there.
    async fn put(&self, path: &BlobPath, data: &[u8]) -> Result<(), StorageError>;

    /// Read all bytes stored at `path`.
    ///
    /// Returns `StorageError::NotFound` when nothing is stored there.
    async fn get(&self, path: &BlobPath) -> Result<Vec<u8>, StorageError>;

    /// Check whether a blob exists at `path`.
    async fn exists(&self, path: &BlobPath) -> Result<bool, StorageError>;

    /// Delete the blob at `path`.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    /// Deleting an absent blob is not an error.
    async fn delete(&self, path: &BlobPath) -> Result<bool, StorageError>;
}
