//! Cache-aware single-file hashing.

use super::buffer::buffer_size_for;
use super::grouping::{group_duplicates, CompareEntry, ComparisonMap, DuplicateGroups};
use super::stream::checksum_reader;
use super::Fingerprint;
use crate::core::cache::{normalize_path, CacheValidation, FingerprintCache, FingerprintRecord};
use crate::core::scanner::regular_file_metadata;
use crate::error::{HashError, ScanError};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A fingerprint plus where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashOutcome {
    pub hash: Fingerprint,
    /// Served from the cache without reading the file
    pub cached: bool,
}

/// Computes fingerprints, consulting and filling the shared cache.
pub struct HashCore {
    cache: Arc<FingerprintCache>,
    validation: CacheValidation,
    files_read: AtomicU64,
}

impl HashCore {
    pub fn new(cache: Arc<FingerprintCache>) -> Self {
        Self {
            cache,
            validation: CacheValidation::default(),
            files_read: AtomicU64::new(0),
        }
    }

    /// Set how cached fingerprints are validated before use
    pub fn with_validation(mut self, validation: CacheValidation) -> Self {
        self.validation = validation;
        self
    }

    pub fn cache(&self) -> &Arc<FingerprintCache> {
        &self.cache
    }

    /// Number of files opened for reading so far
    pub fn files_read(&self) -> u64 {
        self.files_read.load(Ordering::Relaxed)
    }

    /// Fingerprint a file, logging instead of failing.
    ///
    /// Returns `None` if the file is missing, unreadable, not a regular
    /// file, or the cancel check fired part way through.
    pub fn calculate_hash(
        &self,
        path: &Path,
        progress: Option<&mut dyn FnMut(u64)>,
        cancel: Option<&dyn Fn() -> bool>,
    ) -> Option<Fingerprint> {
        match self.hash_file(path, progress, cancel) {
            Ok(outcome) => Some(outcome.hash),
            Err(e) if e.is_cancelled() => {
                debug!(path = %path.display(), "Hashing cancelled");
                None
            }
            Err(e) => {
                warn!(error = %e, "Skipping file");
                None
            }
        }
    }

    /// Fingerprint a file.
    ///
    /// A cache hit returns without opening the file. On a miss the file is
    /// streamed through CRC-32 and the result stored in the cache.
    pub fn hash_file(
        &self,
        path: &Path,
        progress: Option<&mut dyn FnMut(u64)>,
        cancel: Option<&dyn Fn() -> bool>,
    ) -> Result<HashOutcome, HashError> {
        let key = normalize_path(path);

        let metadata = match self.validation {
            CacheValidation::PathOnly => {
                if let Some(hash) = self.cache.get(&key) {
                    return Ok(HashOutcome { hash, cached: true });
                }
                regular_file_metadata(&key)?
            }
            CacheValidation::SizeAndModified => {
                let metadata = regular_file_metadata(&key)?;
                if let (Some(record), Ok(modified)) = (self.cache.record(&key), metadata.modified()) {
                    if record.is_valid_for(metadata.len(), modified) {
                        return Ok(HashOutcome {
                            hash: record.hash,
                            cached: true,
                        });
                    }
                    debug!(path = %key.display(), "Cached fingerprint is stale");
                }
                metadata
            }
        };

        let mut file = File::open(&key).map_err(|source| HashError::Io {
            path: key.clone(),
            source,
        })?;
        self.files_read.fetch_add(1, Ordering::Relaxed);

        let mut buffer = vec![0u8; buffer_size_for(metadata.len())];
        let value = checksum_reader(&mut file, &mut buffer, progress, cancel)
            .map_err(|source| HashError::Io {
                path: key.clone(),
                source,
            })?
            .ok_or_else(|| HashError::Cancelled { path: key.clone() })?;

        let hash = Fingerprint::from_value(value);
        let mut record = FingerprintRecord::new(key, hash);
        if let Ok(modified) = metadata.modified() {
            record = record.with_metadata(metadata.len(), modified);
        }
        self.cache.put(record);

        Ok(HashOutcome { hash, cached: false })
    }

    /// Whether a fingerprint for `path` is cached
    pub fn has_cached_hash(&self, path: &Path) -> bool {
        self.cache.get(path).is_some()
    }

    /// The cached fingerprint for `path`, without touching the filesystem
    pub fn get_cached_hash(&self, path: &Path) -> Option<Fingerprint> {
        self.cache.get(path)
    }

    /// Forget the cached fingerprint for `path`
    pub fn invalidate(&self, path: &Path) {
        self.cache.invalidate(path);
    }

    /// Forget every cached fingerprint
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Hash every file and group the ones sharing a fingerprint.
    ///
    /// Files that can't be hashed are skipped.
    pub fn find_duplicates_in_list(&self, files: &[PathBuf]) -> DuplicateGroups {
        group_duplicates(files.iter().filter_map(|path| {
            self.calculate_hash(path, None, None)
                .map(|hash| (path.clone(), hash))
        }))
    }

    /// Compare files that exist under the same name in both folders.
    ///
    /// Only the top level of each folder is considered. Names whose files
    /// can't be hashed on either side are left out.
    pub fn compare_folders(&self, folder_a: &Path, folder_b: &Path) -> Result<ComparisonMap, ScanError> {
        let files_a = list_folder_files(folder_a)?;
        let files_b = list_folder_files(folder_b)?;

        let mut comparison = BTreeMap::new();
        for (name, path_a) in &files_a {
            let Some(path_b) = files_b.get(name) else {
                continue;
            };
            let hash_a = self.calculate_hash(path_a, None, None);
            let hash_b = self.calculate_hash(path_b, None, None);
            if let (Some(a), Some(b)) = (hash_a, hash_b) {
                comparison.insert(name.clone(), CompareEntry::new(a, b));
            }
        }
        Ok(comparison)
    }

    /// Check a file against a remembered fingerprint, ignoring hex case
    pub fn verify_file_integrity(&self, path: &Path, expected_hash: &str) -> bool {
        self.calculate_hash(path, None, None)
            .map(|hash| hash.matches_hex(expected_hash))
            .unwrap_or(false)
    }
}

/// Regular files directly inside `folder`, keyed by file name
pub fn list_folder_files(folder: &Path) -> Result<BTreeMap<String, PathBuf>, ScanError> {
    if !folder.is_dir() {
        return Err(ScanError::NotFound {
            path: folder.to_path_buf(),
        });
    }

    let mut files = BTreeMap::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(folder = %folder.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.path().is_file() {
            continue;
        }
        files.insert(
            entry.file_name().to_string_lossy().into_owned(),
            entry.into_path(),
        );
    }
    Ok(files)
}
