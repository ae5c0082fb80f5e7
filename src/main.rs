//! # fingerprint CLI
//!
//! Command-line interface for the file fingerprinting engine.
//!
//! ## Usage
//! ```bash
//! fingerprint dupes ~/Downloads
//! fingerprint checksum ~/isos --output json
//! ```

mod cli;

use file_fingerprint::Result;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    file_fingerprint::init_tracing();
    cli::run()
}
