//! # Scanner Module
//!
//! Turns user input into the file set an operation works on.
//!
//! - `FileDescriptor` - read-only snapshot of a file taken when an operation
//!   starts (path, size, modification time)
//! - `WalkDirScanner` - expands files and directories given on the command
//!   line into an ordered list of regular files
//!
//! ## Example
//! ```rust,ignore
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(&["/Users/me/Documents".into()]);
//! ```

mod walker;

pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::{HashError, ScanError};
use serde::{Deserialize, Serialize};
use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Snapshot of a file taken at operation start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified time
    pub modified: SystemTime,
}

impl FileDescriptor {
    /// Stat a path; only regular files produce a descriptor
    pub fn snapshot(path: &Path) -> Result<Self, HashError> {
        let path = crate::core::cache::normalize_path(path);
        let metadata = regular_file_metadata(&path)?;

        Ok(Self {
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            path,
        })
    }

    /// The file name shown in progress messages
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Stat `path`, accepting only regular files (symlinks are followed)
pub(crate) fn regular_file_metadata(path: &Path) -> Result<Metadata, HashError> {
    let metadata = fs::metadata(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => HashError::NotFound {
            path: path.to_path_buf(),
        },
        _ => HashError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    if !metadata.is_file() {
        return Err(HashError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    Ok(metadata)
}

/// Result of a scan operation
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Regular files found, in walk order
    pub files: Vec<PathBuf>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for file scanners
///
/// Implement this trait to feed operations from another source.
pub trait FileScanner: Send + Sync {
    /// Expand the given paths into regular files
    fn scan(&self, paths: &[PathBuf]) -> ScanResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn snapshot_captures_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, b"12345").unwrap();

        let descriptor = FileDescriptor::snapshot(&path).unwrap();

        assert_eq!(descriptor.size, 5);
        assert_eq!(descriptor.display_name(), "report.pdf");
        assert!(descriptor.path.is_absolute());
    }

    #[test]
    fn regular_file_metadata_matches_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"abc").unwrap();

        let metadata = regular_file_metadata(&path).unwrap();
        let descriptor = FileDescriptor::snapshot(&path).unwrap();

        assert_eq!(metadata.len(), descriptor.size);
        assert_eq!(metadata.modified().unwrap(), descriptor.modified);
        assert!(matches!(
            regular_file_metadata(dir.path()),
            Err(HashError::NotAFile { .. })
        ));
    }

    #[test]
    fn snapshot_rejects_directories_and_missing_files() {
        let dir = TempDir::new().unwrap();

        assert!(matches!(
            FileDescriptor::snapshot(dir.path()),
            Err(HashError::NotAFile { .. })
        ));
        assert!(matches!(
            FileDescriptor::snapshot(&dir.path().join("gone")),
            Err(HashError::NotFound { .. })
        ));
    }
}
