use async_trait::async_trait;
use s3::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use tracing::debug;

use super::error::StorageError;
use super::path::BlobPath;
use super::traits::BlobStore;
use crate::config::S3Config;

/// Blob store backed by an S3-compatible bucket.
///
/// Built without `rust-s3`'s `fail-on-err`, so every response status is
/// inspected here: 404 maps to `NotFound`, 429 and 5xx to `Backend`
/// (retryable), any other non-2xx to `Permanent`.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    max_size: u64,
}

impl S3BlobStore {
    pub fn new(config: &S3Config, max_size: u64) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse::<Region>()
                .map_err(|e| StorageError::Permanent(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Permanent(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Permanent(format!("invalid bucket: {e}")))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket, max_size })
    }
}

/// Transport-level failure; the request may not have reached the store.
fn backend(err: s3::error::S3Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn unexpected_status(op: &str, path: &BlobPath, status: u16) -> StorageError {
    let msg = format!("{op} {path} returned HTTP {status}");
    if status == 429 || status >= 500 {
        StorageError::Backend(msg)
    } else {
        StorageError::Permanent(msg)
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, path: &BlobPath, data: &[u8]) -> Result<(), StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let response = self
            .bucket
            .put_object(path.as_str(), data)
            .await
            .map_err(backend)?;
        match response.status_code() {
            status if is_success(status) => Ok(()),
            status => Err(unexpected_status("PUT", path, status)),
        }
    }

    async fn get(&self, path: &BlobPath) -> Result<Vec<u8>, StorageError> {
        let response = self
            .bucket
            .get_object(path.as_str())
            .await
            .map_err(backend)?;
        match response.status_code() {
            status if is_success(status) => Ok(response.bytes().to_vec()),
            404 => Err(StorageError::NotFound(path.to_string())),
            status => Err(unexpected_status("GET", path, status)),
        }
    }

    async fn exists(&self, path: &BlobPath) -> Result<bool, StorageError> {
        let (_, status) = self
            .bucket
            .head_object(path.as_str())
            .await
            .map_err(backend)?;
        match status {
            status if is_success(status) => Ok(true),
            404 => Ok(false),
            status => Err(unexpected_status("HEAD", path, status)),
        }
    }

    async fn delete(&self, path: &BlobPath) -> Result<bool, StorageError> {
        // S3 answers 204 whether or not the key existed, so check first to
        // report absence accurately.
        if !self.exists(path).await? {
            debug!(%path, "delete of absent blob");
            return Ok(false);
        }

        let response = self
            .bucket
            .delete_object(path.as_str())
            .await
            .map_err(backend)?;
        match response.status_code() {
            status if is_success(status) => Ok(true),
            404 => Ok(false),
            status => Err(unexpected_status("DELETE", path, status)),
        }
    }
}
