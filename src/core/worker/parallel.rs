//! Bounded thread-pool worker.

use super::plan::{plan_units, run_unit, ResultBuilder};
use super::sequential::SequentialWorker;
use super::task::{begin, finish, guarded_hash, unit_totals, Tally};
use super::{default_pool_size, OperationOutcome, Worker, WorkerKind};
use crate::core::hasher::HashCore;
use crate::core::operation::{CancellationToken, OperationRequest, ProgressTracker};
use crate::error::WorkerError;
use crate::events::EventSender;
use rayon::prelude::*;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, warn};

/// Hashes files concurrently on a dedicated rayon pool.
///
/// Cancellation is only checked when a task starts: tasks already running
/// finish their file, queued ones are skipped. Progress and per-file events
/// are emitted under one lock, so reported bytes never go backwards.
pub struct ParallelWorker {
    core: Arc<HashCore>,
    pool_size: usize,
}

/// State shared by all tasks of one run
struct Shared {
    tracker: ProgressTracker,
    tally: Tally,
    builder: ResultBuilder,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ParallelWorker {
    pub fn new(core: Arc<HashCore>) -> Self {
        Self {
            core,
            pool_size: default_pool_size(),
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }
}

impl Worker for ParallelWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Parallel
    }

    fn run(
        &self,
        request: &OperationRequest,
        token: &CancellationToken,
        events: &EventSender,
    ) -> OperationOutcome {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.pool_size)
            .thread_name(|i| format!("fingerprint-worker-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                let error = WorkerError::PoolBuild(e.to_string());
                warn!(error = %error, "Falling back to sequential worker");
                return SequentialWorker::new(Arc::clone(&self.core)).run(request, token, events);
            }
        };

        let started = Instant::now();
        let (units, plan_errors) = plan_units(request);
        begin(request, &units, self.kind(), events);

        let (total_files, total_bytes) = unit_totals(&units);
        let shared = Mutex::new(Shared {
            tracker: ProgressTracker::new(total_files, total_bytes, events.clone()),
            tally: Tally::new(request, units.len(), plan_errors),
            builder: ResultBuilder::new(request.kind.tag()),
        });

        pool.install(|| {
            units.par_iter().for_each(|unit| {
                if token.is_cancelled() {
                    lock(&shared).tally.skipped += 1;
                    return;
                }

                let result = run_unit(unit, |file| {
                    let attempt = guarded_hash(&self.core, file, None, None);
                    let mut guard = lock(&shared);
                    guard.tally.record_file(file, &attempt, events);
                    guard.tracker.file_done(&file.display_name(), file.size);
                    attempt.map(|outcome| outcome.hash)
                });

                let mut guard = lock(&shared);
                if let Some(output) = guard.tally.record_unit(result) {
                    guard.builder.push(output);
                }
            });
        });

        let Shared {
            mut tracker,
            tally,
            builder,
        } = shared.into_inner().unwrap_or_else(PoisonError::into_inner);

        if tally.skipped > 0 {
            debug!(skipped = tally.skipped, "Queued tasks skipped after cancellation");
            tracker.mark_cancelled();
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
