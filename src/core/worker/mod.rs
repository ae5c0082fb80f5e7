//! # Worker Module
//!
//! Executes one [`OperationRequest`] and reports through events.
//!
//! Both workers share the same planning and result assembly, so for the
//! same input they produce the same result. Every run emits:
//!
//! 1. `Operation::Started` once planning is done
//! 2. `Hash::FileHashed`, `Hash::Error` and `Hash::Progress` per file
//! 3. exactly one `Operation::Result` (partial when cancelled)
//! 4. `Operation::Finished` last

mod factory;
mod parallel;
mod plan;
mod sequential;
mod task;

pub use factory::{DefaultWorkerFactory, WorkerFactory};
pub use parallel::ParallelWorker;
pub use sequential::{SequentialWorker, DEFAULT_CANCEL_CHECK_INTERVAL};
pub(crate) use task::panic_message;

use crate::core::operation::{CancellationToken, OperationRequest, OperationResult, OperationSummary};
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::thread;

/// Upper bound on parallel worker threads
pub const MAX_POOL_SIZE: usize = 8;

/// Which execution strategy ran an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerKind {
    Sequential,
    Parallel,
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerKind::Sequential => write!(f, "sequential"),
            WorkerKind::Parallel => write!(f, "parallel"),
        }
    }
}

/// Result and summary of a finished run
#[derive(Debug, Clone)]
pub struct OperationOutcome {
    pub result: OperationResult,
    pub summary: OperationSummary,
}

/// Trait for operation executors
pub trait Worker: Send + Sync {
    fn kind(&self) -> WorkerKind;

    /// Run the request to completion or cancellation.
    ///
    /// Per-file failures are reported as events and never abort the run.
    fn run(&self, request: &OperationRequest, token: &CancellationToken, events: &EventSender) -> OperationOutcome;
}

/// Twice the available cores, capped at [`MAX_POOL_SIZE`]
pub fn default_pool_size() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_mul(2)
        .min(MAX_POOL_SIZE)
}
