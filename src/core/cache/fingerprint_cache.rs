//! Thread-safe cache facade with graceful fallback.

use super::{normalize_path, CacheStats, CacheStore, FingerprintRecord, InMemoryCache, SqliteCache};
use crate::core::hasher::Fingerprint;
use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Which backend is serving the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    Sqlite,
    Memory,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Sqlite => "sqlite",
            CacheKind::Memory => "memory",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-to-fingerprint store shared by every worker thread.
///
/// Keys are normalized before they reach the backend. Backend failures at
/// lookup time are logged and treated as a miss; failures when storing are
/// logged and dropped. Callers only see which backend is active through
/// [`cache_type`](Self::cache_type).
pub struct FingerprintCache {
    store: Box<dyn CacheStore>,
    kind: CacheKind,
}

impl FingerprintCache {
    /// Open the persistent cache, degrading to memory-only if it can't be opened
    pub fn open(path: &Path) -> Self {
        match SqliteCache::open(path) {
            Ok(store) => {
                info!(path = %path.display(), "Opened fingerprint cache");
                Self::with_store(Box::new(store), CacheKind::Sqlite)
            }
            Err(e) => {
                warn!(error = %e, "Persistent cache unavailable, using memory-only cache");
                Self::in_memory()
            }
        }
    }

    /// A memory-only cache
    pub fn in_memory() -> Self {
        Self::with_store(Box::new(InMemoryCache::new()), CacheKind::Memory)
    }

    /// Wrap an arbitrary store
    pub fn with_store(store: Box<dyn CacheStore>, kind: CacheKind) -> Self {
        Self { store, kind }
    }

    /// The backend serving this cache
    pub fn cache_type(&self) -> CacheKind {
        self.kind
    }

    /// Full record for a path
    pub fn record(&self, path: &Path) -> Option<FingerprintRecord> {
        let key = normalize_path(path);
        match self.store.get(&key) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %key.display(), error = %e, "Cache lookup failed");
                None
            }
        }
    }

    /// Cached fingerprint for a path
    pub fn get(&self, path: &Path) -> Option<Fingerprint> {
        self.record(path).map(|record| record.hash)
    }

    /// Remember a fingerprint for a path
    pub fn set(&self, path: &Path, hash: Fingerprint) {
        self.put(FingerprintRecord::new(path.to_path_buf(), hash));
    }

    /// Remember a full record; its path is normalized first
    pub fn put(&self, mut record: FingerprintRecord) {
        record.path = normalize_path(&record.path);
        debug!(path = %record.path.display(), hash = %record.hash, "Caching fingerprint");
        if let Err(e) = self.store.set(record) {
            warn!(error = %e, "Failed to store fingerprint");
        }
    }

    /// Forget the fingerprint for a path
    pub fn invalidate(&self, path: &Path) {
        let key = normalize_path(path);
        if let Err(e) = self.store.invalidate(&key) {
            warn!(path = %key.display(), error = %e, "Failed to invalidate fingerprint");
        }
    }

    /// Forget every fingerprint
    pub fn clear(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear fingerprint cache");
        }
    }

    /// Backend statistics
    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        self.store.stats()
    }

    /// Drop records for files that no longer exist
    pub fn prune_orphans(&self) -> Result<usize, CacheError> {
        self.store.prune_orphans()
    }
}

impl Default for FingerprintCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Debug for FingerprintCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FingerprintCache")
            .field("kind", &self.kind)
            .finish()
    }
}
