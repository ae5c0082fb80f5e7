//! Directory walking implementation using walkdir.

use super::{FileScanner, ScanResult};
use crate::error::ScanError;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to descend into subdirectories
    pub recursive: bool,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
            include_hidden: false,
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with('.'))
                .unwrap_or(false)
    }

    /// Scan a single directory
    fn scan_directory(&self, root: &Path, result: &mut ScanResult) {
        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let include_hidden = self.config.include_hidden;
        let entries = walker
            .into_iter()
            .filter_entry(|entry| include_hidden || !Self::is_hidden(entry));

        for entry_result in entries {
            match entry_result {
                Ok(entry) => {
                    if entry.path().is_file() {
                        result.files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
                    result.errors.push(ScanError::ReadDirectory {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    });
                }
            }
        }
    }
}

impl FileScanner for WalkDirScanner {
    fn scan(&self, paths: &[PathBuf]) -> ScanResult {
        let mut result = ScanResult::default();

        for path in paths {
            if path.is_file() {
                result.files.push(path.clone());
            } else if path.is_dir() {
                self.scan_directory(path, &mut result);
            } else {
                result.errors.push(ScanError::NotFound { path: path.clone() });
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn scan_empty_directory_returns_empty_vec() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = WalkDirScanner::new(ScanConfig::default());

        let result = scanner.scan(&[temp_dir.path().to_path_buf()]);

        assert!(result.files.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn scan_returns_files_in_name_order() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("b.txt"));
        touch(&temp_dir.path().join("a.txt"));

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]);

        assert_eq!(result.files.len(), 2);
        assert!(result.files[0].ends_with("a.txt"));
        assert!(result.files[1].ends_with("b.txt"));
    }

    #[test]
    fn scan_traverses_nested_directories_unless_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        touch(&temp_dir.path().join("root.bin"));
        touch(&subdir.join("nested.bin"));

        let recursive = WalkDirScanner::new(ScanConfig::default());
        assert_eq!(recursive.scan(&[temp_dir.path().to_path_buf()]).files.len(), 2);

        let flat = WalkDirScanner::new(ScanConfig {
            recursive: false,
            ..Default::default()
        });
        assert_eq!(flat.scan(&[temp_dir.path().to_path_buf()]).files.len(), 1);
    }

    #[test]
    fn scan_excludes_hidden_entries_by_default() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("visible.bin"));
        touch(&temp_dir.path().join(".hidden.bin"));
        let hidden_dir = temp_dir.path().join(".git");
        fs::create_dir(&hidden_dir).unwrap();
        touch(&hidden_dir.join("config"));

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[temp_dir.path().to_path_buf()]);
        assert_eq!(result.files.len(), 1);

        let scanner = WalkDirScanner::new(ScanConfig {
            include_hidden: true,
            ..Default::default()
        });
        assert_eq!(scanner.scan(&[temp_dir.path().to_path_buf()]).files.len(), 3);
    }

    #[test]
    fn explicit_files_are_taken_as_is() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join(".dotfile");
        touch(&file);

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[file.clone()]);

        assert_eq!(result.files, vec![file]);
    }

    #[test]
    fn scan_nonexistent_path_records_error() {
        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(&[PathBuf::from("/nonexistent/path/12345")]);

        assert!(result.files.is_empty());
        assert_eq!(result.errors.len(), 1);
    }
}
