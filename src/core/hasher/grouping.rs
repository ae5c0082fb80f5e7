//! Turning per-file fingerprints into operation results.

use super::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Fingerprint -> files sharing it; only groups with two or more members
pub type DuplicateGroups = BTreeMap<Fingerprint, Vec<PathBuf>>;

/// File name -> comparison outcome
pub type ComparisonMap = BTreeMap<String, CompareEntry>;

/// Path -> fingerprint
pub type ChecksumMap = BTreeMap<PathBuf, Fingerprint>;

/// Outcome of comparing one file against its external counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareEntry {
    pub is_same: bool,
    pub hash_a: Fingerprint,
    pub hash_b: Fingerprint,
}

impl CompareEntry {
    pub fn new(hash_a: Fingerprint, hash_b: Fingerprint) -> Self {
        Self {
            is_same: hash_a == hash_b,
            hash_a,
            hash_b,
        }
    }
}

/// Group fingerprinted files by hash, keeping only real duplicates.
///
/// Paths inside a group are sorted, so the result does not depend on the
/// order files were hashed in.
pub fn group_duplicates<I>(hashed: I) -> DuplicateGroups
where
    I: IntoIterator<Item = (PathBuf, Fingerprint)>,
{
    let mut groups: DuplicateGroups = BTreeMap::new();
    for (path, hash) in hashed {
        groups.entry(hash).or_default().push(path);
    }

    groups.retain(|_, paths| {
        paths.sort();
        paths.dedup();
        paths.len() >= 2
    });
    groups
}
