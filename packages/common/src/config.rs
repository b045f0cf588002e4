use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Which object store implementation backs file content.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Local directory tree. Intended for development.
    #[default]
    Filesystem,
    /// S3-compatible bucket (AWS, GCS interoperability, MinIO, ...).
    S3,
}

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    /// Region name. Used verbatim as the signing region when `endpoint` is set.
    #[serde(default = "default_s3_region")]
    pub region: String,
    /// Custom endpoint URL, e.g. `https://storage.googleapis.com` or a MinIO host.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Use `endpoint/bucket/key` addressing instead of virtual-host style.
    #[serde(default)]
    pub path_style: bool,
}

fn default_s3_region() -> String {
    "us-east-1".into()
}

/// App-level blob storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Default: filesystem.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend. Default: "./data/blobs".
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Largest accepted file content in bytes. Default: 16 MiB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
    /// Per-call deadline for object store operations. Default: 10 seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Required when `backend = "s3"`.
    #[serde(default)]
    pub s3: Option<S3Config>,
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_max_blob_size() -> u64 {
    16 * 1024 * 1024
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            max_blob_size: default_max_blob_size(),
            timeout_secs: default_timeout_secs(),
            s3: None,
        }
    }
}
