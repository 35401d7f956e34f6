//! Command implementations shared by the CLI and the HTTP server.

use std::fmt::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactEntry, UploadReceipt};
use crate::config::Config;
use crate::storage::ArtifactBackend;
use crate::storage::local::LocalArtifactStore;

/// Message attached to a successful upload.
pub const UPLOAD_MESSAGE: &str = "File uploaded successfully";

/// Message attached to a successful delete.
pub const DELETE_MESSAGE: &str = "File deleted successfully";

/// Liveness report; does not touch the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Confirmation returned by upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(flatten)]
    pub receipt: UploadReceipt,
}

/// Confirmation returned by delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub filename: String,
}

/// Listing wrapper, serialized as `{"files": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileList {
    pub files: Vec<ArtifactEntry>,
}

#[must_use]
pub fn health() -> HealthStatus {
    HealthStatus {
        status: "healthy".to_string(),
    }
}

/// Open the store at `root_override`, or at the configured root.
///
/// # Errors
///
/// Returns an error if config loading fails or the root cannot be created.
pub fn open_store(root_override: Option<&Path>) -> anyhow::Result<LocalArtifactStore> {
    let root = match root_override {
        Some(root) => root.to_path_buf(),
        None => Config::load()?.storage_root(),
    };

    tracing::info!(root = %root.display(), "storage directory");
    Ok(LocalArtifactStore::open(root)?)
}

/// Store `content` under `filename`.
///
/// # Errors
///
/// Returns an error if the filename is invalid or the write fails.
pub fn upload(
    store: &impl ArtifactBackend,
    filename: &str,
    content: &[u8],
    content_type: Option<&str>,
) -> anyhow::Result<UploadResponse> {
    let receipt = store.upload(filename, content, content_type)?;

    Ok(UploadResponse {
        message: UPLOAD_MESSAGE.to_string(),
        receipt,
    })
}

/// Upload a file from the local filesystem.
///
/// The artifact is named `name`, or after the file itself when `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or has no usable name, or if
/// the upload fails.
pub fn upload_file(
    store: &impl ArtifactBackend,
    path: &Path,
    name: Option<&str>,
    content_type: Option<&str>,
) -> anyhow::Result<UploadResponse> {
    let filename = match name {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Cannot derive a filename from {}", path.display()))?
            .to_string(),
    };

    let content = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;

    upload(store, &filename, &content, content_type)
}

/// List every visible artifact, newest first.
///
/// # Errors
///
/// Returns an error only if the store cannot be listed at all.
pub fn list(store: &impl ArtifactBackend) -> anyhow::Result<FileList> {
    Ok(FileList {
        files: store.list()?,
    })
}

/// Fetch an artifact's bytes.
///
/// # Errors
///
/// Returns an error if the artifact is missing or unreadable.
pub fn download(store: &impl ArtifactBackend, filename: &str) -> anyhow::Result<Vec<u8>> {
    Ok(store.read(filename)?)
}

/// Delete an artifact.
///
/// # Errors
///
/// Returns an error if the artifact is missing or cannot be removed.
pub fn delete(store: &impl ArtifactBackend, filename: &str) -> anyhow::Result<DeleteResponse> {
    store.delete(filename)?;

    Ok(DeleteResponse {
        message: DELETE_MESSAGE.to_string(),
        filename: filename.to_string(),
    })
}

/// Render a listing as human-readable lines.
#[must_use]
pub fn format_listing(list: &FileList) -> String {
    if list.files.is_empty() {
        return "No files found.\n".to_string();
    }

    let mut output = String::new();
    for entry in &list.files {
        let _ = writeln!(
            output,
            "{}  {:>10}  {}  {}",
            entry.metadata.uploaded_at,
            human_size(entry.metadata.size),
            entry.storage_path,
            entry.metadata.content_type.as_deref().unwrap_or("-"),
        );
    }
    let _ = writeln!(output, "{} file(s)", list.files.len());
    output
}

/// Format a byte count with a binary unit suffix.
#[allow(clippy::cast_precision_loss)]
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in UNITS[1..].iter().copied() {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}
