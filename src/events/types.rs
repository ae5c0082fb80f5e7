//! Event type definitions for progress reporting.

use crate::core::hasher::Fingerprint;
use crate::core::operation::{OperationKindTag, OperationResult, OperationSummary};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// All events emitted while an operation runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Per-file hashing events
    Hash(HashEvent),
    /// Operation-level lifecycle events
    Operation(OperationEvent),
}

/// Events emitted per file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    /// Progress update; byte counts never decrease within an operation
    Progress(HashProgress),
    /// A file's fingerprint is known (computed or served from cache)
    FileHashed {
        path: PathBuf,
        hash: Fingerprint,
        size: u64,
    },
    /// A file could not be hashed; the operation continues
    Error { path: PathBuf, message: String },
}

/// Progress information during hashing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashProgress {
    /// Files finished so far (hashed or skipped)
    pub current: usize,
    /// Total number of files in the operation
    pub total: usize,
    /// Bytes processed so far
    pub bytes_processed: u64,
    /// Total bytes in the operation
    pub total_bytes: u64,
    /// Name of the file being worked on
    pub current_name: String,
}

impl HashProgress {
    /// Byte-weighted completion in the range 0.0..=1.0
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            if self.total == 0 {
                return 1.0;
            }
            return self.current as f64 / self.total as f64;
        }
        (self.bytes_processed as f64 / self.total_bytes as f64).min(1.0)
    }
}

/// Operation lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OperationEvent {
    /// Emitted once, before any file is touched
    Started {
        id: Uuid,
        kind: OperationKindTag,
        total_files: usize,
        total_bytes: u64,
    },
    /// Final (possibly partial) result, emitted at most once
    Result(OperationResult),
    /// Emitted exactly once, always last
    Finished {
        success: bool,
        summary: OperationSummary,
    },
    /// The operation could not run at all
    Error { message: String },
}
