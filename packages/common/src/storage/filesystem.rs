use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::path::BlobPath;
use super::traits::BlobStore;

/// Filesystem-backed blob store for local development.
///
/// Each blob lives at `{base_path}/{blob path}`. Writes go to
/// `{base_path}/.tmp` first and are renamed into place, so readers never
/// observe a half-written file.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    ///
    /// Temp files left in `.tmp` by writes that never finished are removed.
    /// Assumes one store instance per `base_path`.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        let temp_dir = base_path.join(".tmp");
        fs::create_dir_all(&temp_dir).await?;
        sweep_temp_dir(&temp_dir).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn blob_path(&self, path: &BlobPath) -> PathBuf {
        let mut full = self.base_path.clone();
        full.extend(path.segments());
        full
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

async fn sweep_temp_dir(temp_dir: &Path) -> Result<(), StorageError> {
    let mut entries = fs::read_dir(temp_dir).await?;
    let mut removed = 0usize;
    while let Some(entry) = entries.next_entry().await? {
        match fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "Failed to remove stale temp file"
                );
            }
        }
    }
    if removed > 0 {
        tracing::info!(removed, dir = %temp_dir.display(), "Removed stale temp files");
    }
    Ok(())
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, path: &BlobPath, data: &[u8]) -> Result<(), StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let blob_path = self.blob_path(path);
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn get(&self, path: &BlobPath) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.blob_path(path)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &BlobPath) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.blob_path(path)).await?)
    }

    async fn delete(&self, path: &BlobPath) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(path);
        match fs::remove_file(&blob_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }

        // Prune the now-empty per-file directory. Fails harmlessly if a
        // sibling blob still lives there.
        if let Some(parent) = blob_path.parent()
            && parent != self.base_path
        {
            let _ = fs::remove_dir(parent).await;
        }

        Ok(true)
    }
}
