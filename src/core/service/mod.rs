//! # Service Module
//!
//! Public entry points for the three operations.
//!
//! Each `start_*` call snapshots the submitted paths, picks a worker (see
//! [`ServiceConfig::select_worker`]) and runs it on its own thread. Events
//! flow through a channel to a relay thread that calls the caller's
//! [`OperationHandler`], so the caller is never blocked.
//!
//! An operation that cannot run at all (e.g. the external folder of a
//! comparison is missing) gets `on_error` followed by
//! `on_finished(false, ..)`, with no `on_started` and no `on_result`.

mod config;
mod handle;
mod handler;
mod ports;

pub use config::{ServiceConfig, WorkerSelection, DEFAULT_PARALLEL_THRESHOLD};
pub use handle::OperationHandle;
pub use handler::OperationHandler;
pub use ports::{ProgressReporter, ReporterRelay, ResultsDisplay};

use crate::core::cache::FingerprintCache;
use crate::core::hasher::HashCore;
use crate::core::operation::{
    CancellationToken, OperationKind, OperationRequest, OperationResult, OperationSummary,
};
use crate::core::worker::{panic_message, DefaultWorkerFactory, WorkerFactory, WorkerKind};
use crate::error::{Result, ScanError, WorkerError};
use crate::events::{Event, EventChannel, EventSender, OperationEvent};
use handle::ActiveOperation;
use handler::dispatch;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Orchestrates fingerprinting operations.
///
/// Owns its cache and worker factory; nothing is looked up globally.
pub struct HashService {
    cache: Arc<FingerprintCache>,
    core: Arc<HashCore>,
    factory: Arc<dyn WorkerFactory>,
    config: ServiceConfig,
    active: Mutex<Vec<Arc<ActiveOperation>>>,
}

impl HashService {
    pub fn new(cache: Arc<FingerprintCache>, config: ServiceConfig) -> Self {
        let core = Arc::new(HashCore::new(Arc::clone(&cache)).with_validation(config.validation));
        let factory = DefaultWorkerFactory::new(Arc::clone(&core))
            .pool_size(config.effective_pool_size())
            .cancel_check_interval(config.cancel_check_interval);
        Self {
            cache,
            core,
            factory: Arc::new(factory),
            config,
            active: Mutex::new(Vec::new()),
        }
    }

    /// Replace the worker factory
    pub fn with_factory(mut self, factory: Arc<dyn WorkerFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn cache(&self) -> &Arc<FingerprintCache> {
        &self.cache
    }

    pub fn core(&self) -> &Arc<HashCore> {
        &self.core
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Group the files by identical content
    pub fn start_duplicate_scan<H: OperationHandler>(
        &self,
        files: Vec<PathBuf>,
        handler: H,
    ) -> Result<OperationHandle<H>> {
        self.start(OperationKind::Duplicates, files, handler)
    }

    /// Compare each file with the same-named file in `external_folder`
    pub fn start_external_comparison<H: OperationHandler>(
        &self,
        files: Vec<PathBuf>,
        external_folder: PathBuf,
        handler: H,
    ) -> Result<OperationHandle<H>> {
        self.start(OperationKind::Compare { external_folder }, files, handler)
    }

    /// Report the fingerprint of every file
    pub fn start_checksum_calculation<H: OperationHandler>(
        &self,
        files: Vec<PathBuf>,
        handler: H,
    ) -> Result<OperationHandle<H>> {
        self.start(OperationKind::Checksum, files, handler)
    }

    /// Cancel every running operation.
    ///
    /// Idempotent; does nothing when no operation is running.
    pub fn cancel(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.retain(|op| !op.is_done());
        for op in active.iter() {
            debug!(id = %op.id, "Cancelling operation");
            op.token.cancel();
        }
    }

    /// Operations started by this service that have not finished
    pub fn active_operations(&self) -> usize {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.retain(|op| !op.is_done());
        active.len()
    }

    fn start<H: OperationHandler>(
        &self,
        kind: OperationKind,
        files: Vec<PathBuf>,
        mut handler: H,
    ) -> Result<OperationHandle<H>> {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        handler.attach(token.clone());

        let (sender, receiver) = EventChannel::new();
        let relay = thread::Builder::new()
            .name("fingerprint-relay".to_string())
            .spawn(move || {
                while let Some(event) = receiver.recv() {
                    dispatch(&mut handler, event);
                }
                handler
            })
            .map_err(WorkerError::Spawn)?;

        let state = Arc::new(ActiveOperation::new(id, token.clone()));
        {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            active.retain(|op| !op.is_done());
            active.push(Arc::clone(&state));
        }

        let expected_worker = self.config.select_worker(files.len());
        let fallback = sender.clone();
        let job = OperationJob {
            id,
            kind: kind.clone(),
            files,
            factory: Arc::clone(&self.factory),
            config: self.config.clone(),
            token: token.clone(),
            events: sender,
        };
        let worker_state = Arc::clone(&state);
        let spawned = thread::Builder::new()
            .name(format!("fingerprint-{:?}", kind.tag()).to_lowercase())
            .spawn(move || {
                job.run();
                worker_state.mark_done();
            });

        let worker = match spawned {
            Ok(worker) => Some(worker),
            Err(e) => {
                let error = WorkerError::Spawn(e);
                error!(id = %id, error = %error, "Operation could not start");
                fail(id, &kind, expected_worker, error.to_string(), &fallback);
                state.mark_done();
                None
            }
        };
        drop(fallback);

        Ok(OperationHandle::new(id, token, worker, relay))
    }
}

/// Everything the worker thread needs
struct OperationJob {
    id: Uuid,
    kind: OperationKind,
    files: Vec<PathBuf>,
    factory: Arc<dyn WorkerFactory>,
    config: ServiceConfig,
    token: CancellationToken,
    events: EventSender,
}

impl OperationJob {
    fn run(self) {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.execute()));
        if let Err(payload) = attempt {
            let message = WorkerError::ThreadPanicked(panic_message(payload.as_ref())).to_string();
            error!(id = %self.id, error = %message, "Operation aborted");
            fail(
                self.id,
                &self.kind,
                self.config.select_worker(self.files.len()),
                message,
                &self.events,
            );
        }
    }

    fn execute(&self) {
        let worker_kind = self.config.select_worker(self.files.len());

        if let OperationKind::Compare { external_folder } = &self.kind {
            if !external_folder.is_dir() {
                let error = ScanError::NotFound {
                    path: external_folder.clone(),
                };
                error!(id = %self.id, error = %error, "External folder unavailable");
                fail(self.id, &self.kind, worker_kind, error.to_string(), &self.events);
                return;
            }
        }

        let mut request = OperationRequest::from_paths(self.kind.clone(), &self.files);
        request.id = self.id;
        info!(
            id = %self.id,
            files = request.files.len(),
            rejected = request.rejected.len(),
            worker = %worker_kind,
            "Dispatching operation"
        );

        let worker = self.factory.create(worker_kind);
        worker.run(&request, &self.token, &self.events);
    }
}

/// Report an operation that never reached a worker
fn fail(id: Uuid, kind: &OperationKind, worker: WorkerKind, message: String, events: &EventSender) {
    let summary = OperationSummary {
        id,
        kind: kind.tag(),
        worker,
        total: 0,
        succeeded: 0,
        failed: 0,
        cache_hits: 0,
        cancelled: false,
        duration_ms: 0,
        message: message.clone(),
        errors: vec![message.clone()],
    };
    events.send(Event::Operation(OperationEvent::Error { message }));
    events.send(Event::Operation(OperationEvent::Finished {
        success: false,
        summary,
    }));
}

/// Convenience for callers that only want the final result
#[derive(Debug, Default)]
pub struct ResultCollector {
    pub result: Option<OperationResult>,
    pub summary: Option<OperationSummary>,
    pub errors: Vec<String>,
}

impl OperationHandler for ResultCollector {
    fn on_file_error(&mut self, path: &std::path::Path, message: &str) {
        debug!(path = %path.display(), error = message, "File skipped");
    }

    fn on_result(&mut self, result: OperationResult) {
        self.result = Some(result);
    }

    fn on_finished(&mut self, _success: bool, summary: &OperationSummary) {
        self.summary = Some(summary.clone());
    }

    fn on_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::Fingerprint;
    use crate::core::operation::OperationKindTag;
    use crate::events::HashProgress;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Records the order of callbacks
    #[derive(Default)]
    struct Trace(Vec<String>);

    impl OperationHandler for Trace {
        fn on_started(&mut self, _id: Uuid, _kind: OperationKindTag, total_files: usize, _total_bytes: u64) {
            self.0.push(format!("started:{total_files}"));
        }

        fn on_file_hash(&mut self, path: &Path, _hash: Fingerprint, _size: u64) {
            let name = path.file_name().unwrap().to_string_lossy();
            self.0.push(format!("hash:{name}"));
        }

        fn on_file_error(&mut self, _path: &Path, _message: &str) {
            self.0.push("file-error".to_string());
        }

        fn on_result(&mut self, result: OperationResult) {
            self.0.push(format!("result:{}", result.len()));
        }

        fn on_finished(&mut self, success: bool, _summary: &OperationSummary) {
            self.0.push(format!("finished:{success}"));
        }

        fn on_error(&mut self, _message: &str) {
            self.0.push("error".to_string());
        }
    }

    fn service() -> HashService {
        HashService::new(Arc::new(FingerprintCache::in_memory()), ServiceConfig::default())
    }

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn callbacks_arrive_in_contract_order() {
        let dir = TempDir::new().unwrap();
        let files = vec![write(&dir, "a.txt", b"1"), write(&dir, "b.txt", b"2")];

        let trace = service()
            .start_checksum_calculation(files, Trace::default())
            .unwrap()
            .wait()
            .unwrap();

        assert_eq!(
            trace.0,
            vec!["started:2", "hash:a.txt", "hash:b.txt", "result:2", "finished:true"]
        );
    }

    #[test]
    fn missing_external_folder_fails_without_result() {
        let dir = TempDir::new().unwrap();
        let files = vec![write(&dir, "a.txt", b"1")];

        let trace = service()
            .start_external_comparison(files, dir.path().join("nowhere"), Trace::default())
            .unwrap()
            .wait()
            .unwrap();

        assert_eq!(trace.0, vec!["error", "finished:false"]);
    }

    #[test]
    fn vanished_files_are_reported_after_start() {
        let dir = TempDir::new().unwrap();
        let files = vec![write(&dir, "a.txt", b"1"), dir.path().join("gone.txt")];

        let trace = service()
            .start_duplicate_scan(files, Trace::default())
            .unwrap()
            .wait()
            .unwrap();

        assert_eq!(
            trace.0,
            vec!["started:1", "file-error", "hash:a.txt", "result:0", "finished:true"]
        );
    }

    #[test]
    fn cancel_is_idempotent_and_safe_when_idle() {
        let service = service();
        service.cancel();
        service.cancel();
        assert_eq!(service.active_operations(), 0);

        let dir = TempDir::new().unwrap();
        let handle = service
            .start_checksum_calculation(vec![write(&dir, "a.txt", b"1")], ResultCollector::default())
            .unwrap();
        handle.cancel();
        handle.cancel();
        let collector = handle.wait().unwrap();
        service.cancel();

        assert!(collector.summary.is_some());
        assert_eq!(service.active_operations(), 0);
    }

    #[test]
    fn progress_reaches_handler() {
        #[derive(Default)]
        struct Progress(Vec<HashProgress>);
        impl OperationHandler for Progress {
            fn on_progress(&mut self, progress: &HashProgress) {
                self.0.push(progress.clone());
            }
        }

        let dir = TempDir::new().unwrap();
        let files = vec![write(&dir, "a.txt", b"hello"), write(&dir, "b.txt", b"world!")];

        let progress = service()
            .start_checksum_calculation(files, Progress::default())
            .unwrap()
            .wait()
            .unwrap();

        let last = progress.0.last().unwrap();
        assert_eq!(last.current, 2);
        assert_eq!(last.bytes_processed, 11);
        assert_eq!(last.total_bytes, 11);
    }
}
