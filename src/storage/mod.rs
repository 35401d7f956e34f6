//! Storage backend trait and implementations.
//!
//! The local backend keeps artifacts in a `<root>/<YYYY>/<MM>/<filename>`
//! tree with a `metadata.json` sidecar in every month directory.

pub mod layout;
pub mod local;
pub mod locator;
pub mod sidecar;

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};

use crate::artifact::{ArtifactEntry, FilenameError, UploadReceipt};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(#[from] FilenameError),

    #[error("Failed to read: {0}")]
    ReadError(String),

    #[error("Failed to write: {0}")]
    WriteError(String),

    #[error("Failed to delete: {0}")]
    DeleteError(String),

    #[error("Failed to serialize: {0}")]
    SerializeError(String),
}

/// Trait for artifact storage backends.
pub trait ArtifactBackend: Send + Sync {
    /// Store `content` under `filename`, stamped with the current local time.
    ///
    /// # Errors
    ///
    /// See [`ArtifactBackend::upload_at`].
    fn upload(
        &self,
        filename: &str,
        content: &[u8],
        content_type: Option<&str>,
    ) -> Result<UploadReceipt, StorageError> {
        self.upload_at(filename, content, content_type, Local::now().naive_local())
    }

    /// Store `content` under `filename`, stamped with `now`.
    ///
    /// An existing artifact with the same name in the same bucket is
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the filename is invalid or the bytes or
    /// metadata cannot be written.
    fn upload_at(
        &self,
        filename: &str,
        content: &[u8],
        content_type: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<UploadReceipt, StorageError>;

    /// Every visible artifact, newest upload first.
    ///
    /// # Errors
    ///
    /// Unreadable buckets and missing metadata are skipped, so
    /// implementations only fail when the whole listing is impossible.
    fn list(&self) -> Result<Vec<ArtifactEntry>, StorageError>;

    /// Resolve `filename` to the path of its bytes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no bucket holds the file.
    fn locate(&self, filename: &str) -> Result<PathBuf, StorageError>;

    /// Read the full content of `filename`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if absent, `ReadError` on I/O failure.
    fn read(&self, filename: &str) -> Result<Vec<u8>, StorageError>;

    /// Remove `filename` and its metadata entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if absent, `DeleteError` if the file
    /// cannot be removed.
    fn delete(&self, filename: &str) -> Result<(), StorageError>;
}
