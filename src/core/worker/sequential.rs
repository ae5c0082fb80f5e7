//! Single-thread worker.

use super::plan::{plan_units, run_unit, ResultBuilder, TaskError};
use super::task::{begin, finish, guarded_hash, unit_totals, Tally};
use super::{OperationOutcome, Worker, WorkerKind};
use crate::core::hasher::HashCore;
use crate::core::operation::{CancellationToken, OperationRequest, ProgressTracker};
use crate::events::EventSender;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Default number of files between worker-level cancellation checks
pub const DEFAULT_CANCEL_CHECK_INTERVAL: usize = 10;

/// Processes files one at a time, in submission order.
///
/// Cancellation is checked at two levels: every `cancel_check_interval`
/// files here, and after every chunk inside the hash core, so both many
/// small files and one huge file stop promptly.
pub struct SequentialWorker {
    core: Arc<HashCore>,
    cancel_check_interval: usize,
}

impl SequentialWorker {
    pub fn new(core: Arc<HashCore>) -> Self {
        Self {
            core,
            cancel_check_interval: DEFAULT_CANCEL_CHECK_INTERVAL,
        }
    }

    /// Check the token every `interval` files (minimum 1)
    pub fn with_cancel_check_interval(mut self, interval: usize) -> Self {
        self.cancel_check_interval = interval.max(1);
        self
    }
}

impl Worker for SequentialWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Sequential
    }

    fn run(
        &self,
        request: &OperationRequest,
        token: &CancellationToken,
        events: &EventSender,
    ) -> OperationOutcome {
        let started = Instant::now();
        let (units, plan_errors) = plan_units(request);
        begin(request, &units, self.kind(), events);

        let (total_files, total_bytes) = unit_totals(&units);
        let mut tracker = ProgressTracker::new(total_files, total_bytes, events.clone());
        let mut tally = Tally::new(request, units.len(), plan_errors);
        let mut builder = ResultBuilder::new(request.kind.tag());
        let is_cancelled = || token.is_cancelled();

        for (index, unit) in units.iter().enumerate() {
            if index % self.cancel_check_interval == 0 && token.is_cancelled() {
                debug!(completed = index, "Cancellation observed between files");
                tracker.mark_cancelled();
                break;
            }

            let result = run_unit(unit, |file| {
                let name = file.display_name();
                let mut on_chunk = |bytes: u64| tracker.partial(&name, bytes);
                let attempt = guarded_hash(&self.core, file, Some(&mut on_chunk), Some(&is_cancelled));

                tally.record_file(file, &attempt, events);
                if !matches!(attempt, Err(TaskError::Cancelled)) {
                    tracker.file_done(&name, file.size);
                }
                attempt.map(|outcome| outcome.hash)
            });

            let stop = matches!(result, Err(TaskError::Cancelled));
            if let Some(output) = tally.record_unit(result) {
                builder.push(output);
            }
            if stop {
                debug!(completed = index, "Cancellation observed inside a file");
                tracker.mark_cancelled();
                break;
            }
        }

        finish(
            request,
            self.kind(),
            builder.build(),
            tally,
            tracker.state(),
            started,
            events,
        )
    }
}
