//! Worker construction.

use super::{default_pool_size, ParallelWorker, SequentialWorker, Worker, WorkerKind, DEFAULT_CANCEL_CHECK_INTERVAL};
use crate::core::hasher::HashCore;
use std::sync::Arc;

/// Builds workers for the orchestration service
pub trait WorkerFactory: Send + Sync {
    fn create(&self, kind: WorkerKind) -> Box<dyn Worker>;
}

/// Builds the stock workers around one shared [`HashCore`]
pub struct DefaultWorkerFactory {
    core: Arc<HashCore>,
    pool_size: usize,
    cancel_check_interval: usize,
}

impl DefaultWorkerFactory {
    pub fn new(core: Arc<HashCore>) -> Self {
        Self {
            core,
            pool_size: default_pool_size(),
            cancel_check_interval: DEFAULT_CANCEL_CHECK_INTERVAL,
        }
    }

    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn cancel_check_interval(mut self, interval: usize) -> Self {
        self.cancel_check_interval = interval;
        self
    }
}

impl WorkerFactory for DefaultWorkerFactory {
    fn create(&self, kind: WorkerKind) -> Box<dyn Worker> {
        match kind {
            WorkerKind::Sequential => Box::new(
                SequentialWorker::new(Arc::clone(&self.core))
                    .with_cancel_check_interval(self.cancel_check_interval),
            ),
            WorkerKind::Parallel => {
                Box::new(ParallelWorker::new(Arc::clone(&self.core)).with_pool_size(self.pool_size))
            }
        }
    }
}
