//! # Core Module
//!
//! The UI-agnostic fingerprinting engine.
//!
//! ## Modules
//! - `cache` - Persists fingerprints keyed by normalized path
//! - `hasher` - Streams files through CRC-32 and groups/compares the results
//! - `scanner` - Snapshots files and enumerates directories
//! - `operation` - Requests, results, progress and cancellation
//! - `worker` - Sequential and parallel executors
//! - `service` - Starts operations and relays their events to callers

pub mod cache;
pub mod hasher;
pub mod operation;
pub mod scanner;
pub mod service;
pub mod worker;

// Re-export commonly used types
pub use cache::{CacheValidation, FingerprintCache};
pub use hasher::{Fingerprint, HashCore};
pub use operation::{CancellationToken, OperationResult, OperationSummary};
pub use service::{HashService, OperationHandle, OperationHandler, ServiceConfig};
