//! # Operation Module
//!
//! The vocabulary shared by workers and the orchestration service:
//! requests, results, progress counters and cancellation.

mod cancel;
mod progress;
mod types;

pub use cancel::CancellationToken;
pub use progress::{ProgressState, ProgressTracker};
pub use types::{
    status_line, OperationKind, OperationKindTag, OperationRequest, OperationResult,
    OperationSummary, RejectedFile,
};
