use std::fmt;

use super::error::StorageError;

/// Maximum key length accepted by S3-compatible stores.
const MAX_PATH_BYTES: usize = 1024;

/// A validated object key such as `projects/7/files/0190.../main.py`.
///
/// Keys are relative, `/`-separated and contain no empty, `.` or `..`
/// segments, so they map onto both object stores and directory trees
/// without being rewritten.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlobPath(String);

impl BlobPath {
    /// Parse a caller-supplied key, rejecting anything a store would have to alter.
    pub fn parse(raw: impl Into<String>) -> Result<Self, StorageError> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(StorageError::InvalidPath("path is empty".into()));
        }
        if raw.len() > MAX_PATH_BYTES {
            return Err(StorageError::InvalidPath(format!(
                "path is longer than {MAX_PATH_BYTES} bytes"
            )));
        }
        if raw.chars().any(|c| c.is_control()) {
            return Err(StorageError::InvalidPath(
                "path contains control characters".into(),
            ));
        }
        if raw.contains('\\') {
            return Err(StorageError::InvalidPath("path contains '\\'".into()));
        }
        if raw
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(StorageError::InvalidPath(format!(
                "path '{raw}' has an empty, '.' or '..' segment"
            )));
        }

        Ok(Self(raw))
    }

    /// Deterministic key for a file's content.
    ///
    /// The same project, file and name always resolve to the same key.
    pub fn for_file(
        project_id: impl fmt::Display,
        file_id: impl fmt::Display,
        file_name: &str,
    ) -> Result<Self, StorageError> {
        Self::parse(format!("projects/{project_id}/files/{file_id}/{file_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `/`-separated components of the key.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobPath({})", self.0)
    }
}

impl AsRef<str> for BlobPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
