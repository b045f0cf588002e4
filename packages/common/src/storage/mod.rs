mod error;
mod hash;
mod path;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};

pub use error::StorageError;
pub use hash::ContentHash;
pub use path::BlobPath;
pub use traits::BlobStore;

/// Build the blob store selected by `config.backend`.
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    match config.backend {
        StorageBackend::Filesystem => {
            let store =
                filesystem::FilesystemBlobStore::new(config.path.clone(), config.max_blob_size)
                    .await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "object-storage")]
        StorageBackend::S3 => {
            let s3_config = config.s3.as_ref().ok_or_else(|| {
                StorageError::Permanent("storage.s3 section is required for the s3 backend".into())
            })?;
            let store = s3::S3BlobStore::new(s3_config, config.max_blob_size)?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "object-storage"))]
        StorageBackend::S3 => Err(StorageError::Permanent(
            "built without the object-storage feature".into(),
        )),
    }
}
