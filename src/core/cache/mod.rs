//! # Cache Module
//!
//! Remembers fingerprints so unchanged files are never read twice.
//!
//! ## Contract
//! - `get`/`set`/`invalidate`/`clear`, keyed by normalized absolute path
//! - At most one record per key; a later `set` replaces the earlier one
//! - Safe to call from many worker threads at once
//! - No automatic eviction: records live until invalidated or cleared
//!
//! ## Backends
//! - `SqliteCache` - Persistent storage using SQLite
//! - `InMemoryCache` - Process-lifetime storage, and the fallback when the
//!   persistent backend cannot be opened

mod fingerprint_cache;
mod key;
mod memory;
mod sqlite;
mod traits;

pub use fingerprint_cache::{CacheKind, FingerprintCache};
pub use key::normalize_path;
pub use memory::InMemoryCache;
pub use sqlite::SqliteCache;
pub use traits::CacheStore;

use crate::core::hasher::Fingerprint;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// A cached fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// Normalized path of the file
    pub path: PathBuf,
    /// The computed fingerprint
    pub hash: Fingerprint,
    /// Algorithm tag, always `"crc32"` for records written by this crate
    pub algorithm: String,
    /// File size at time of hashing, when known
    pub file_size: Option<u64>,
    /// File modification time at time of hashing, when known
    pub file_modified: Option<SystemTime>,
    /// `file_modified` only carries whole seconds (records from older caches)
    #[serde(default)]
    pub modified_in_seconds: bool,
    /// When the fingerprint was computed
    pub computed_at: SystemTime,
}

impl FingerprintRecord {
    /// Create a record stamped with the current time
    pub fn new(path: PathBuf, hash: Fingerprint) -> Self {
        Self {
            path,
            hash,
            algorithm: Fingerprint::ALGORITHM.to_string(),
            file_size: None,
            file_modified: None,
            modified_in_seconds: false,
            computed_at: SystemTime::now(),
        }
    }

    /// Attach the size and modification time observed when hashing
    pub fn with_metadata(mut self, file_size: u64, file_modified: SystemTime) -> Self {
        self.file_size = Some(file_size);
        self.file_modified = Some(file_modified);
        self.modified_in_seconds = false;
        self
    }

    /// Check whether this record still describes a file.
    ///
    /// Records written without metadata are never considered valid here.
    /// Timestamps are compared at full precision unless the record only
    /// kept whole seconds.
    pub fn is_valid_for(&self, file_size: u64, file_modified: SystemTime) -> bool {
        let (Some(size), Some(modified)) = (self.file_size, self.file_modified) else {
            return false;
        };
        if size != file_size {
            return false;
        }
        if self.modified_in_seconds {
            unix_secs(modified) == unix_secs(file_modified)
        } else {
            modified == file_modified
        }
    }
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// How cached fingerprints are checked before being served
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheValidation {
    /// Serve any cached fingerprint for the path until it is invalidated
    #[default]
    PathOnly,
    /// Serve a cached fingerprint only while size and mtime still match
    SizeAndModified,
}

/// Cache statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Oldest entry timestamp
    pub oldest_entry: Option<SystemTime>,
    /// Newest entry timestamp
    pub newest_entry: Option<SystemTime>,
}
