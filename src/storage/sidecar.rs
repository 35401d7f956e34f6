//! Per-directory `metadata.json` sidecar.
//!
//! The sidecar is a JSON object mapping filename to [`ArtifactMetadata`].
//! Entries are kept as raw JSON so that a rewrite carries unknown fields and
//! malformed siblings through untouched; they are decoded one at a time with
//! [`parse_entry`].
//!
//! Writes replace the whole file through a temporary file in the same
//! directory followed by a rename. Callers that mutate the same directory
//! concurrently must serialize through [`SidecarLocks`].

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::artifact::{ArtifactMetadata, SIDECAR_FILE_NAME};
use crate::storage::StorageError;

/// Filename to raw metadata entry, as persisted.
pub type SidecarMap = BTreeMap<String, Value>;

/// Mode for a fresh sidecar, before the umask, matching `fs::write`.
#[cfg(unix)]
const DEFAULT_MODE: u32 = 0o666;

/// Decode one entry, logging and skipping it if it does not fit
/// [`ArtifactMetadata`].
#[must_use]
pub fn parse_entry(mapping: &SidecarMap, filename: &str) -> Option<ArtifactMetadata> {
    let raw = mapping.get(filename)?;
    match ArtifactMetadata::deserialize(raw) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            tracing::warn!(filename, error = %e, "ignoring malformed sidecar entry");
            None
        }
    }
}

/// Failures reading a sidecar. An absent sidecar is not an error.
#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("corrupt sidecar {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot read sidecar {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle on the sidecar of one directory.
#[derive(Debug, Clone)]
pub struct Sidecar {
    dir: PathBuf,
}

impl Sidecar {
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(SIDECAR_FILE_NAME)
    }

    /// Load the full mapping; an absent file yields an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns `SidecarError::Corrupt` if the file is not a JSON object,
    /// `SidecarError::Io` for any other read failure.
    pub fn read_all(&self) -> Result<SidecarMap, SidecarError> {
        let path = self.path();

        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SidecarMap::new()),
            Err(source) => return Err(SidecarError::Io { path, source }),
        };

        serde_json::from_slice(&contents).map_err(|source| SidecarError::Corrupt { path, source })
    }

    /// Metadata for one file, or `None` if the sidecar has no usable entry
    /// for it.
    ///
    /// # Errors
    ///
    /// Same as [`Sidecar::read_all`].
    pub fn read_one(&self, filename: &str) -> Result<Option<ArtifactMetadata>, SidecarError> {
        Ok(parse_entry(&self.read_all()?, filename))
    }

    /// Set `filename`'s entry, keeping all other entries as they are.
    ///
    /// An unreadable sidecar, or one that is not a JSON object, is treated
    /// as empty and replaced, which drops whatever entries it held.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the new sidecar cannot be written.
    pub fn upsert(&self, filename: &str, entry: &ArtifactMetadata) -> Result<(), StorageError> {
        let entry =
            serde_json::to_value(entry).map_err(|e| StorageError::SerializeError(e.to_string()))?;

        let mut mapping = self.read_all().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "replacing unreadable sidecar");
            SidecarMap::new()
        });

        mapping.insert(filename.to_string(), entry);
        self.write_all(&mapping)
    }

    /// Drop `filename`'s entry if present. Best-effort: failures are logged.
    ///
    /// Returns `true` if an entry was removed and the sidecar rewritten.
    pub fn remove(&self, filename: &str) -> bool {
        let mut mapping = match self.read_all() {
            Ok(mapping) => mapping,
            Err(e) => {
                tracing::error!(error = %e, filename, "cannot update sidecar after deletion");
                return false;
            }
        };

        if mapping.remove(filename).is_none() {
            return false;
        }

        match self.write_all(&mapping) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, filename, "cannot update sidecar after deletion");
                false
            }
        }
    }

    fn write_all(&self, mapping: &SidecarMap) -> Result<(), StorageError> {
        let path = self.path();

        let contents = serde_json::to_string_pretty(mapping)
            .map_err(|e| StorageError::SerializeError(e.to_string()))?;

        let mut staged = self
            .staging_file(&path)
            .map_err(|e| StorageError::WriteError(format!("{}: {e}", self.dir.display())))?;

        staged
            .write_all(contents.as_bytes())
            .map_err(|e| StorageError::WriteError(format!("{}: {e}", path.display())))?;

        staged
            .persist(&path)
            .map_err(|e| StorageError::WriteError(format!("{}: {}", path.display(), e.error)))?;

        Ok(())
    }

    /// Temporary file next to the sidecar, carrying the mode the sidecar
    /// already has, or the mode `fs::write` would give a new file.
    #[cfg(unix)]
    fn staging_file(&self, path: &Path) -> std::io::Result<NamedTempFile> {
        use std::os::unix::fs::PermissionsExt;

        let permissions = fs::metadata(path).map_or_else(
            |_| fs::Permissions::from_mode(DEFAULT_MODE),
            |existing| existing.permissions(),
        );

        tempfile::Builder::new()
            .permissions(permissions)
            .tempfile_in(&self.dir)
    }

    #[cfg(not(unix))]
    fn staging_file(&self, _path: &Path) -> std::io::Result<NamedTempFile> {
        NamedTempFile::new_in(&self.dir)
    }
}

/// In-process locks serializing sidecar read-modify-write cycles per directory.
#[derive(Debug, Default)]
pub struct SidecarLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl SidecarLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `dir`.
    pub fn with_lock<T>(&self, dir: &Path, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(dir.to_path_buf()).or_default())
        };

        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}
