//! Artifact records and filename rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-directory metadata sidecar.
pub const SIDECAR_FILE_NAME: &str = "metadata.json";

/// Reasons a caller-supplied filename is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilenameError {
    #[error("filename cannot be empty")]
    Empty,

    #[error("filename cannot be a relative directory reference: {0}")]
    DirectoryReference(String),

    #[error("filename contains a path separator or NUL: {0}")]
    IllegalCharacter(String),

    #[error("filename is reserved for the metadata sidecar: {0}")]
    Reserved(String),
}

/// Metadata for one stored artifact.
///
/// Stored as the value side of `metadata.json`, keyed by `filename`.
/// `storage_path` is relative to the store root (e.g. "2024/03/a.txt").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub filename: String,
    pub size: u64,
    /// Declared by the uploader, never sniffed.
    pub content_type: Option<String>,
    /// ISO-8601 local timestamp with microseconds.
    pub uploaded_at: String,
    pub storage_path: String,
}

/// What an upload hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub filename: String,
    pub size: u64,
    pub storage_path: String,
}

impl From<&ArtifactMetadata> for UploadReceipt {
    fn from(meta: &ArtifactMetadata) -> Self {
        Self {
            filename: meta.filename.clone(),
            size: meta.size,
            storage_path: meta.storage_path.clone(),
        }
    }
}

/// One element of a store listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub filename: String,
    pub storage_path: String,
    pub metadata: ArtifactMetadata,
}

/// Check that `filename` names a single file directly inside a bucket.
///
/// # Errors
///
/// Returns a `FilenameError` if the name is empty, a `.`/`..` reference,
/// contains `/`, `\` or NUL, or collides with the sidecar file.
pub fn validate_filename(filename: &str) -> Result<(), FilenameError> {
    if filename.is_empty() {
        return Err(FilenameError::Empty);
    }

    if filename == "." || filename == ".." {
        return Err(FilenameError::DirectoryReference(filename.to_string()));
    }

    if filename.contains(['/', '\\', '\0']) {
        return Err(FilenameError::IllegalCharacter(filename.to_string()));
    }

    if filename == SIDECAR_FILE_NAME {
        return Err(FilenameError::Reserved(filename.to_string()));
    }

    Ok(())
}
