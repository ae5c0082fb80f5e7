//! Request, result and summary types.

use crate::core::hasher::{ChecksumMap, ComparisonMap, DuplicateGroups};
use crate::core::scanner::FileDescriptor;
use crate::core::worker::WorkerKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// What an operation does with the fingerprints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// Group files with identical content
    Duplicates,
    /// Compare each file with the same-named file in another folder
    Compare { external_folder: PathBuf },
    /// Report every file's fingerprint
    Checksum,
}

impl OperationKind {
    pub fn tag(&self) -> OperationKindTag {
        match self {
            OperationKind::Duplicates => OperationKindTag::Duplicates,
            OperationKind::Compare { .. } => OperationKindTag::Compare,
            OperationKind::Checksum => OperationKindTag::Checksum,
        }
    }
}

/// [`OperationKind`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKindTag {
    Duplicates,
    Compare,
    Checksum,
}

impl fmt::Display for OperationKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKindTag::Duplicates => write!(f, "Duplicate scan"),
            OperationKindTag::Compare => write!(f, "External comparison"),
            OperationKindTag::Checksum => write!(f, "Checksum calculation"),
        }
    }
}

/// A submitted path that could not be snapshotted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedFile {
    pub path: PathBuf,
    pub message: String,
}

/// A file set plus what to do with it.
///
/// The descriptors are snapshots taken when the operation starts and are
/// never mutated afterwards. Paths that failed the snapshot travel along in
/// `rejected` so the worker can report them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRequest {
    pub id: Uuid,
    pub kind: OperationKind,
    pub files: Vec<FileDescriptor>,
    #[serde(default)]
    pub rejected: Vec<RejectedFile>,
}

impl OperationRequest {
    pub fn new(kind: OperationKind, files: Vec<FileDescriptor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            files,
            rejected: Vec::new(),
        }
    }

    /// Snapshot every path, keeping failures as [`RejectedFile`]s
    pub fn from_paths(kind: OperationKind, paths: &[PathBuf]) -> Self {
        let mut files = Vec::with_capacity(paths.len());
        let mut rejected = Vec::new();
        for path in paths {
            match FileDescriptor::snapshot(path) {
                Ok(file) => files.push(file),
                Err(e) => rejected.push(RejectedFile {
                    path: path.clone(),
                    message: e.to_string(),
                }),
            }
        }
        Self {
            rejected,
            ..Self::new(kind, files)
        }
    }

    pub fn duplicates(files: Vec<FileDescriptor>) -> Self {
        Self::new(OperationKind::Duplicates, files)
    }

    pub fn compare(files: Vec<FileDescriptor>, external_folder: PathBuf) -> Self {
        Self::new(OperationKind::Compare { external_folder }, files)
    }

    pub fn checksum(files: Vec<FileDescriptor>) -> Self {
        Self::new(OperationKind::Checksum, files)
    }

    /// Sum of the snapshot sizes, saturating
    pub fn total_bytes(&self) -> u64 {
        self.files
            .iter()
            .fold(0u64, |total, file| total.saturating_add(file.size))
    }
}

/// Final result of an operation; partial if it was cancelled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationResult {
    /// Only groups with two or more members
    Duplicates(DuplicateGroups),
    Compare(ComparisonMap),
    Checksum(ChecksumMap),
}

impl OperationResult {
    pub fn empty(kind: OperationKindTag) -> Self {
        match kind {
            OperationKindTag::Duplicates => OperationResult::Duplicates(Default::default()),
            OperationKindTag::Compare => OperationResult::Compare(Default::default()),
            OperationKindTag::Checksum => OperationResult::Checksum(Default::default()),
        }
    }

    pub fn kind(&self) -> OperationKindTag {
        match self {
            OperationResult::Duplicates(_) => OperationKindTag::Duplicates,
            OperationResult::Compare(_) => OperationKindTag::Compare,
            OperationResult::Checksum(_) => OperationKindTag::Checksum,
        }
    }

    /// Number of groups, compared names or checksummed files
    pub fn len(&self) -> usize {
        match self {
            OperationResult::Duplicates(groups) => groups.len(),
            OperationResult::Compare(entries) => entries.len(),
            OperationResult::Checksum(sums) => sums.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What happened during an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSummary {
    pub id: Uuid,
    pub kind: OperationKindTag,
    pub worker: WorkerKind,
    /// Work units planned (files, or file pairs for a comparison)
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cache_hits: usize,
    pub cancelled: bool,
    pub duration_ms: u64,
    /// One line for the user, e.g. "Calculated checksums for 12 files"
    pub message: String,
    /// Per-file failures, in the order they were recorded
    pub errors: Vec<String>,
}

impl OperationSummary {
    /// Not cancelled, and either something succeeded or nothing failed
    pub fn success(&self) -> bool {
        !self.cancelled && (self.succeeded > 0 || self.failed == 0)
    }
}

/// Build the user-visible status line for a finished operation
pub fn status_line(result: &OperationResult, succeeded: usize, cancelled: bool) -> String {
    let mut line = match result {
        OperationResult::Duplicates(groups) => {
            let duplicates: usize = groups.values().map(|g| g.len()).sum();
            format!(
                "Found {} duplicate groups ({} files) among {} files",
                groups.len(),
                duplicates,
                succeeded
            )
        }
        OperationResult::Compare(entries) => {
            let same = entries.values().filter(|e| e.is_same).count();
            format!(
                "Compared {} files: {} identical, {} different",
                entries.len(),
                same,
                entries.len() - same
            )
        }
        OperationResult::Checksum(sums) => {
            format!("Calculated checksums for {} files", sums.len())
        }
    };
    if cancelled {
        line.push_str(" (cancelled)");
    }
    line
}
