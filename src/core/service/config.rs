//! Service configuration.

use crate::core::cache::CacheValidation;
use crate::core::worker::{default_pool_size, WorkerKind, DEFAULT_CANCEL_CHECK_INTERVAL};
use crate::error::{FingerprintError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default minimum file count for the parallel worker in `Auto` mode
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 8;

/// How the service picks a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerSelection {
    /// Sequential below `parallel_threshold` files, parallel otherwise
    #[default]
    Auto,
    Sequential,
    Parallel,
}

/// Configuration for [`HashService`](super::HashService)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub worker: WorkerSelection,
    pub parallel_threshold: usize,
    /// Parallel pool size; `None` means twice the cores, capped at 8
    pub pool_size: Option<usize>,
    /// Files between worker-level cancellation checks
    pub cancel_check_interval: usize,
    pub validation: CacheValidation,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            worker: WorkerSelection::Auto,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            pool_size: None,
            cancel_check_interval: DEFAULT_CANCEL_CHECK_INTERVAL,
            validation: CacheValidation::default(),
        }
    }
}

impl ServiceConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| FingerprintError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| FingerprintError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn worker(mut self, worker: WorkerSelection) -> Self {
        self.worker = worker;
        self
    }

    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    pub fn cancel_check_interval(mut self, interval: usize) -> Self {
        self.cancel_check_interval = interval;
        self
    }

    pub fn validation(mut self, validation: CacheValidation) -> Self {
        self.validation = validation;
        self
    }

    pub fn effective_pool_size(&self) -> usize {
        self.pool_size.unwrap_or_else(default_pool_size).max(1)
    }

    /// Worker for a set of `file_count` files
    pub fn select_worker(&self, file_count: usize) -> WorkerKind {
        match self.worker {
            WorkerSelection::Sequential => WorkerKind::Sequential,
            WorkerSelection::Parallel => WorkerKind::Parallel,
            WorkerSelection::Auto if file_count >= self.parallel_threshold => WorkerKind::Parallel,
            WorkerSelection::Auto => WorkerKind::Sequential,
        }
    }
}
