//! Per-file task boundary and operation bookkeeping.

use super::plan::{TaskError, UnitOutput, WorkUnit};
use super::{OperationOutcome, WorkerKind};
use crate::core::hasher::{HashCore, HashOutcome};
use crate::core::operation::{status_line, OperationRequest, OperationResult, OperationSummary, ProgressState};
use crate::core::scanner::FileDescriptor;
use crate::error::WorkerError;
use crate::events::{Event, EventSender, HashEvent, OperationEvent};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{info, warn};

/// Hash one file, turning errors and panics into a [`TaskError`].
pub(crate) fn guarded_hash(
    core: &HashCore,
    file: &FileDescriptor,
    progress: Option<&mut dyn FnMut(u64)>,
    cancel: Option<&dyn Fn() -> bool>,
) -> Result<HashOutcome, TaskError> {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        core.hash_file(&file.path, progress, cancel)
    }));

    match attempt {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) if e.is_cancelled() => Err(TaskError::Cancelled),
        Ok(Err(e)) => {
            warn!(error = %e, "Skipping file");
            Err(TaskError::Failed(e.to_string()))
        }
        Err(payload) => {
            let error = WorkerError::TaskPanicked {
                path: file.path.clone(),
                message: panic_message(payload.as_ref()),
            };
            warn!(error = %error, "Task panicked");
            Err(TaskError::Failed(error.to_string()))
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Running counts for one operation
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cache_hits: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl Tally {
    /// Start counting; snapshot rejections count as failed units
    pub fn new(request: &OperationRequest, units: usize, plan_errors: Vec<String>) -> Self {
        let mut errors: Vec<String> = request.rejected.iter().map(|r| r.message.clone()).collect();
        errors.extend(plan_errors);
        Self {
            total: units + request.rejected.len(),
            failed: request.rejected.len(),
            errors,
            ..Default::default()
        }
    }

    /// Emit the per-file event for a hashing attempt
    pub fn record_file(
        &mut self,
        file: &FileDescriptor,
        result: &Result<HashOutcome, TaskError>,
        events: &EventSender,
    ) {
        match result {
            Ok(outcome) => {
                if outcome.cached {
                    self.cache_hits += 1;
                }
                events.send(Event::Hash(HashEvent::FileHashed {
                    path: file.path.clone(),
                    hash: outcome.hash,
                    size: file.size,
                }));
            }
            Err(TaskError::Failed(message)) => {
                self.errors.push(message.clone());
                events.send(Event::Hash(HashEvent::Error {
                    path: file.path.clone(),
                    message: message.clone(),
                }));
            }
            Err(TaskError::Cancelled) => {}
        }
    }

    /// Count a finished unit; returns its output if it succeeded
    pub fn record_unit(&mut self, result: Result<UnitOutput, TaskError>) -> Option<UnitOutput> {
        match result {
            Ok(output) => {
                self.succeeded += 1;
                Some(output)
            }
            Err(TaskError::Failed(_)) => {
                self.failed += 1;
                None
            }
            Err(TaskError::Cancelled) => {
                self.skipped += 1;
                None
            }
        }
    }
}

/// Totals for the progress tracker: (files, bytes)
pub(crate) fn unit_totals(units: &[WorkUnit]) -> (usize, u64) {
    units.iter().fold((0usize, 0u64), |(files, bytes), unit| {
        (files + unit.file_count(), bytes.saturating_add(unit.bytes()))
    })
}

/// Announce the operation
pub(crate) fn begin(request: &OperationRequest, units: &[WorkUnit], worker: WorkerKind, events: &EventSender) {
    let (total_files, total_bytes) = unit_totals(units);
    info!(
        id = %request.id,
        kind = %request.kind.tag(),
        worker = %worker,
        files = total_files,
        bytes = total_bytes,
        "Operation started"
    );
    events.send(Event::Operation(OperationEvent::Started {
        id: request.id,
        kind: request.kind.tag(),
        total_files,
        total_bytes,
    }));

    for rejected in &request.rejected {
        warn!(path = %rejected.path.display(), error = %rejected.message, "Skipping file");
        events.send(Event::Hash(HashEvent::Error {
            path: rejected.path.clone(),
            message: rejected.message.clone(),
        }));
    }
}

/// Emit the (possibly partial) result and the finished event
pub(crate) fn finish(
    request: &OperationRequest,
    worker: WorkerKind,
    result: OperationResult,
    tally: Tally,
    progress: &ProgressState,
    started: Instant,
    events: &EventSender,
) -> OperationOutcome {
    let cancelled = progress.cancelled;
    let summary = OperationSummary {
        id: request.id,
        kind: request.kind.tag(),
        worker,
        total: tally.total,
        succeeded: tally.succeeded,
        failed: tally.failed,
        cache_hits: tally.cache_hits,
        cancelled,
        duration_ms: started.elapsed().as_millis() as u64,
        message: status_line(&result, tally.succeeded, cancelled),
        errors: tally.errors,
    };

    info!(
        id = %summary.id,
        succeeded = summary.succeeded,
        failed = summary.failed,
        cache_hits = summary.cache_hits,
        cancelled,
        "{}",
        summary.message
    );

    events.send(Event::Operation(OperationEvent::Result(result.clone())));
    events.send(Event::Operation(OperationEvent::Finished {
        success: summary.success(),
        summary: summary.clone(),
    }));

    OperationOutcome { result, summary }
}
