//! Local filesystem artifact store.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::artifact::{
    ArtifactEntry, ArtifactMetadata, SIDECAR_FILE_NAME, UploadReceipt, validate_filename,
};
use crate::storage::layout;
use crate::storage::locator::{self, Bucket, Locator};
use crate::storage::sidecar::{self, Sidecar, SidecarLocks, SidecarMap};
use crate::storage::{ArtifactBackend, StorageError};

/// Artifact store rooted at a local directory.
#[derive(Debug)]
pub struct LocalArtifactStore {
    root: PathBuf,
    locator: Locator,
    locks: SidecarLocks,
}

impl LocalArtifactStore {
    /// Open the store at `root`, creating the directory if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::WriteError` if the root cannot be created.
    pub fn open(root: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&root)
            .map_err(|e| StorageError::WriteError(format!("create dir {}: {e}", root.display())))?;

        tracing::debug!(root = %root.display(), "opened artifact store");
        Ok(Self::new(root))
    }

    /// Create a store handle without touching the filesystem.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            locator: Locator::new(root.clone()),
            root,
            locks: SidecarLocks::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn find(&self, filename: &str) -> Result<(Bucket, PathBuf), StorageError> {
        validate_filename(filename)?;

        self.locator
            .find(filename)
            .ok_or_else(|| StorageError::NotFound(filename.to_string()))
    }

    fn list_bucket(bucket: &Bucket, out: &mut Vec<ArtifactEntry>) {
        let entries = match fs::read_dir(&bucket.path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(dir = %bucket.path.display(), error = %e, "cannot read bucket");
                return;
            }
        };

        let mapping = match Sidecar::in_dir(&bucket.path).read_all() {
            Ok(mapping) => mapping,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring metadata for bucket");
                SidecarMap::new()
            }
        };

        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if filename == SIDECAR_FILE_NAME || !path.is_file() {
                continue;
            }

            match sidecar::parse_entry(&mapping, &filename) {
                Some(metadata) => out.push(ArtifactEntry {
                    storage_path: layout::storage_path_in(&bucket.year, &bucket.month, &filename),
                    filename,
                    metadata,
                }),
                None => tracing::warn!(file = %path.display(), "no metadata found for file"),
            }
        }
    }
}

impl ArtifactBackend for LocalArtifactStore {
    fn upload_at(
        &self,
        filename: &str,
        content: &[u8],
        content_type: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<UploadReceipt, StorageError> {
        validate_filename(filename)?;

        let dir = layout::ensure_placement_dir(&self.root, now)
            .map_err(|e| StorageError::WriteError(format!("create bucket: {e}")))?;

        let file_path = dir.join(filename);
        fs::write(&file_path, content)
            .map_err(|e| StorageError::WriteError(format!("{}: {e}", file_path.display())))?;

        let metadata = ArtifactMetadata {
            filename: filename.to_string(),
            size: content.len() as u64,
            content_type: content_type.map(str::to_string),
            uploaded_at: layout::format_timestamp(now),
            storage_path: layout::storage_path(now, filename),
        };
        let receipt = UploadReceipt::from(&metadata);

        self.locks
            .with_lock(&dir, || Sidecar::in_dir(&dir).upsert(filename, &metadata))?;

        tracing::info!(filename, size = receipt.size, path = %receipt.storage_path, "file uploaded");
        Ok(receipt)
    }

    fn list(&self) -> Result<Vec<ArtifactEntry>, StorageError> {
        let mut files = Vec::new();

        if !self.root.exists() {
            tracing::warn!(root = %self.root.display(), "storage directory does not exist");
            return Ok(files);
        }

        for bucket in locator::buckets(&self.root) {
            tracing::debug!(dir = %bucket.path.display(), "scanning bucket");
            Self::list_bucket(&bucket, &mut files);
        }

        files.sort_by(|a, b| b.metadata.uploaded_at.cmp(&a.metadata.uploaded_at));

        tracing::info!(count = files.len(), "listed files");
        Ok(files)
    }

    fn locate(&self, filename: &str) -> Result<PathBuf, StorageError> {
        self.find(filename).map(|(_, path)| path)
    }

    fn read(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.locate(filename)?;

        fs::read(&path).map_err(|e| StorageError::ReadError(format!("{}: {e}", path.display())))
    }

    fn delete(&self, filename: &str) -> Result<(), StorageError> {
        let (bucket, path) = self.find(filename)?;

        fs::remove_file(&path)
            .map_err(|e| StorageError::DeleteError(format!("{}: {e}", path.display())))?;

        let removed = self
            .locks
            .with_lock(&bucket.path, || Sidecar::in_dir(&bucket.path).remove(filename));
        if !removed {
            tracing::warn!(filename, "no sidecar entry removed for deleted file");
        }

        tracing::info!(filename, "file deleted");
        Ok(())
    }
}
