//! Date-based placement of artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime};

/// Year and month bucket names for an upload instant, e.g. `("2024", "03")`.
#[must_use]
pub fn bucket_names(now: NaiveDateTime) -> (String, String) {
    (format!("{:04}", now.year()), format!("{:02}", now.month()))
}

/// `<root>/<YYYY>/<MM>` for the given instant.
#[must_use]
pub fn placement_dir(root: &Path, now: NaiveDateTime) -> PathBuf {
    let (year, month) = bucket_names(now);
    root.join(year).join(month)
}

/// Like [`placement_dir`], creating the directory and its ancestors.
///
/// # Errors
///
/// Propagates the I/O error if the directory cannot be created.
pub fn ensure_placement_dir(root: &Path, now: NaiveDateTime) -> std::io::Result<PathBuf> {
    let dir = placement_dir(root, now);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Root-relative storage path with forward slashes: `YYYY/MM/filename`.
#[must_use]
pub fn storage_path(now: NaiveDateTime, filename: &str) -> String {
    let (year, month) = bucket_names(now);
    format!("{year}/{month}/{filename}")
}

/// Storage path for a file found inside an existing bucket directory.
#[must_use]
pub fn storage_path_in(year: &str, month: &str, filename: &str) -> String {
    format!("{year}/{month}/{filename}")
}

/// Format an upload instant the way the sidecar stores it.
#[must_use]
pub fn format_timestamp(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
