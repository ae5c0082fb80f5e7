//! # File Fingerprint
//!
//! Content fingerprinting for large file sets: CRC-32 checksums, duplicate
//! detection, mirror comparison and integrity checks, backed by a
//! persistent fingerprint cache.
//!
//! ## Architecture
//! - `core` - The engine (cache, hash core, workers, orchestration service)
//! - `events` - Message-passing progress reporting
//! - `error` - Error types
//!
//! ## Example
//! ```rust,no_run
//! use file_fingerprint::core::service::{HashService, ResultCollector, ServiceConfig};
//! use file_fingerprint::core::FingerprintCache;
//! use std::sync::Arc;
//!
//! # fn main() -> file_fingerprint::Result<()> {
//! let service = HashService::new(Arc::new(FingerprintCache::in_memory()), ServiceConfig::default());
//! let handle = service.start_checksum_calculation(vec!["a.bin".into()], ResultCollector::default())?;
//! let collected = handle.wait()?;
//! println!("{:?}", collected.result);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{FingerprintError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. Honours
/// `RUST_LOG`; a second call is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
