//! # Hasher Module
//!
//! Computes content fingerprints for files.
//!
//! ## Algorithm
//! CRC-32 (ISO-HDLC, the zlib/PNG polynomial) over the whole file, formatted
//! as 8 lowercase hex digits. It is fast and non-cryptographic; collisions
//! are possible and accepted.
//!
//! ## How It Works
//! 1. Normalize the path and check the cache; a hit returns immediately
//! 2. Verify the path is an existing regular file
//! 3. Pick a read buffer from the file size (8 KiB / 64 KiB / 256 KiB)
//! 4. Stream the file through the checksum, polling cancellation per chunk
//! 5. Store the fingerprint in the cache
//!
//! ## Example
//! ```rust,ignore
//! let core = HashCore::new(Arc::new(FingerprintCache::in_memory()));
//! let hash = core.calculate_hash(&path, None, None);
//! ```

mod buffer;
mod engine;
mod fingerprint;
mod grouping;
mod stream;

pub use buffer::buffer_size_for;
pub use engine::{list_folder_files, HashCore, HashOutcome};
pub use fingerprint::{Fingerprint, ParseFingerprintError};
pub use grouping::{group_duplicates, ChecksumMap, CompareEntry, ComparisonMap, DuplicateGroups};
pub use stream::checksum_reader;
