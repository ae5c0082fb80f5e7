//! Cache store trait definition.

use super::{CacheStats, FingerprintRecord};
use crate::error::CacheError;
use std::path::Path;

/// Pluggable persistence backend for fingerprints.
///
/// Keys are normalized absolute paths; the [`FingerprintCache`] facade
/// normalizes before calling into a store. Implementations must be safe to
/// call from many worker threads at once.
///
/// [`FingerprintCache`]: super::FingerprintCache
pub trait CacheStore: Send + Sync {
    /// Get the record stored under a key, if any
    fn get(&self, key: &Path) -> Result<Option<FingerprintRecord>, CacheError>;

    /// Store a record, replacing any previous record for the same key
    fn set(&self, record: FingerprintRecord) -> Result<(), CacheError>;

    /// Remove a specific entry
    fn invalidate(&self, key: &Path) -> Result<(), CacheError>;

    /// Clear all cached entries
    fn clear(&self) -> Result<(), CacheError>;

    /// Get cache statistics
    fn stats(&self) -> Result<CacheStats, CacheError>;

    /// Remove entries for files that no longer exist
    ///
    /// Returns the number of entries removed.
    fn prune_orphans(&self) -> Result<usize, CacheError>;
}
