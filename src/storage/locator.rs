//! Filename lookup across the year/month bucket tree.

use std::fs;
use std::path::{Path, PathBuf};

/// A month directory under the store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub year: String,
    pub month: String,
    pub path: PathBuf,
}

/// Subdirectories of `dir` with UTF-8 names, newest name first.
///
/// Non-directories are skipped. An unreadable `dir` yields nothing.
fn subdirectories(dir: &Path) -> Vec<(String, PathBuf)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::error!(dir = %dir.display(), error = %e, "cannot read directory");
            }
            return Vec::new();
        }
    };

    let mut dirs: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            Some((name, entry.path()))
        })
        .collect();

    dirs.sort_by(|a, b| b.0.cmp(&a.0));
    dirs
}

/// Every month bucket under `root`, years and months in descending order.
///
/// A missing root has no buckets.
#[must_use]
pub fn buckets(root: &Path) -> Vec<Bucket> {
    subdirectories(root)
        .into_iter()
        .flat_map(|(year, year_path)| {
            subdirectories(&year_path)
                .into_iter()
                .map(move |(month, path)| Bucket {
                    year: year.clone(),
                    month,
                    path,
                })
        })
        .collect()
}

/// Resolves bare filenames to paths by scanning the bucket tree.
#[derive(Debug, Clone)]
pub struct Locator {
    root: PathBuf,
}

impl Locator {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// First bucket holding a regular file named `filename`.
    ///
    /// Buckets are probed newest first, so when the same name exists in
    /// several months the most recent copy wins.
    #[must_use]
    pub fn find(&self, filename: &str) -> Option<(Bucket, PathBuf)> {
        buckets(&self.root).into_iter().find_map(|bucket| {
            let candidate = bucket.path.join(filename);
            candidate.is_file().then_some((bucket, candidate))
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn missing_root_has_no_buckets() {
        let temp = TempDir::new().unwrap();
        assert!(buckets(&temp.path().join("absent")).is_empty());
    }

    #[test]
    fn buckets_are_newest_first() {
        let temp = TempDir::new().unwrap();
        for dir in ["2023/12", "2024/01", "2024/03", "2023/02"] {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
        }

        let names: Vec<String> = buckets(temp.path())
            .into_iter()
            .map(|b| format!("{}/{}", b.year, b.month))
            .collect();

        assert_eq!(names, ["2024/03", "2024/01", "2023/12", "2023/02"]);
    }

    #[test]
    fn non_directories_are_skipped() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "stray.txt");
        touch(temp.path(), "2024/stray.txt");
        fs::create_dir_all(temp.path().join("2024/03")).unwrap();

        let found = buckets(temp.path());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].month, "03");
    }

    #[test]
    fn find_locates_file_in_any_bucket() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "2023/07/old.bin");
        touch(temp.path(), "2024/03/new.bin");

        let locator = Locator::new(temp.path().to_path_buf());
        let (bucket, path) = locator.find("old.bin").unwrap();

        assert_eq!(bucket.year, "2023");
        assert_eq!(path, temp.path().join("2023/07/old.bin"));
    }

    #[test]
    fn find_returns_none_when_absent() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "2024/03/a.txt");

        let locator = Locator::new(temp.path().to_path_buf());
        assert!(locator.find("b.txt").is_none());
    }

    #[test]
    fn find_ignores_directories_with_matching_name() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("2024/03/a.txt")).unwrap();

        let locator = Locator::new(temp.path().to_path_buf());
        assert!(locator.find("a.txt").is_none());
    }

    #[test]
    fn duplicate_names_resolve_to_newest_bucket() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "2023/12/dup.txt");
        touch(temp.path(), "2024/01/dup.txt");

        let locator = Locator::new(temp.path().to_path_buf());
        let (_, path) = locator.find("dup.txt").unwrap();

        assert_eq!(path, temp.path().join("2024/01/dup.txt"));
    }
}
