//! # Error Module
//!
//! Error types for the fingerprinting engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-file failures stay per-file** - a batch operation reports them as
//!   events and summary entries, never as a failure of the whole batch

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while fingerprinting a single file
#[derive(Error, Debug)]
pub enum HashError {
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Not a regular file: {path}")]
    NotAFile { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Hashing of {path} was cancelled")]
    Cancelled { path: PathBuf },
}

impl HashError {
    /// Whether this error is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HashError::Cancelled { .. })
    }
}

/// Errors that occur with the fingerprint cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to open cache database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Cache corruption detected at {path}. Delete this file and try again.")]
    Corrupted { path: PathBuf },

    #[error("Stored fingerprint for {path} is not valid hex: {value}")]
    InvalidFingerprint { path: PathBuf, value: String },
}

/// Errors raised by the worker runtime
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to build worker pool: {0}")]
    PoolBuild(String),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Task for {path} panicked: {message}")]
    TaskPanicked { path: PathBuf, message: String },

    #[error("Worker thread panicked: {0}")]
    ThreadPanicked(String),
}

/// Errors raised while enumerating input files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, FingerprintError>;
