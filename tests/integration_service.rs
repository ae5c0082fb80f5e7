//! Integration tests for the orchestration service.
//!
//! These tests drive whole operations through `HashService` and check:
//! - Duplicate grouping and the CRC-32 check values
//! - Sequential/parallel equivalence
//! - Partial results on cancellation
//! - Error reporting for unusable input

use assert_fs::prelude::*;
use assert_fs::TempDir;
use file_fingerprint::core::cache::{
    CacheKind, CacheStats, CacheStore, FingerprintCache, FingerprintRecord, InMemoryCache,
};
use file_fingerprint::core::hasher::{Fingerprint, HashCore};
use file_fingerprint::core::operation::{CancellationToken, OperationRequest, OperationResult, OperationSummary};
use file_fingerprint::core::scanner::FileDescriptor;
use file_fingerprint::core::service::{HashService, OperationHandler, ResultCollector, ServiceConfig, WorkerSelection};
use file_fingerprint::core::worker::{ParallelWorker, SequentialWorker, Worker};
use file_fingerprint::error::CacheError;
use file_fingerprint::events::null_sender;
use predicates::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

fn service(worker: WorkerSelection) -> HashService {
    HashService::new(
        Arc::new(FingerprintCache::in_memory()),
        ServiceConfig::default().worker(worker),
    )
}

/// A mix of unique and repeated contents
fn fixture(dir: &TempDir, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let child = dir.child(format!("file-{i:03}.dat"));
            child.write_binary(&vec![(i % 7) as u8; 512 + (i % 7) * 100]).unwrap();
            child.path().to_path_buf()
        })
        .collect()
}

fn collect(handle: file_fingerprint::core::OperationHandle<ResultCollector>) -> (OperationResult, OperationSummary) {
    let collector = handle.wait().unwrap();
    (collector.result.unwrap(), collector.summary.unwrap())
}

#[test]
fn duplicate_scan_groups_identical_files() {
    let dir = TempDir::new().unwrap();
    dir.child("a.txt").write_str("same bytes").unwrap();
    dir.child("b.txt").write_str("same bytes").unwrap();
    dir.child("c.txt").write_str("other bytes").unwrap();
    let files = ["a.txt", "b.txt", "c.txt"]
        .iter()
        .map(|name| dir.child(name).path().to_path_buf())
        .collect();

    let (result, summary) = collect(
        service(WorkerSelection::Auto)
            .start_duplicate_scan(files, ResultCollector::default())
            .unwrap(),
    );

    let OperationResult::Duplicates(groups) = result else {
        panic!("expected duplicate groups");
    };
    assert_eq!(groups.len(), 1);
    let members: Vec<&str> = groups
        .values()
        .next()
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap())
        .collect();
    assert_eq!(members, vec!["a.txt", "b.txt"]);
    assert!(summary.success());
    assert_eq!(summary.message, "Found 1 duplicate groups (2 files) among 3 files");
}

#[test]
fn checksums_match_crc32_check_values() {
    let dir = TempDir::new().unwrap();
    dir.child("check.txt").write_str("123456789").unwrap();
    dir.child("empty.txt").touch().unwrap();
    let check = dir.child("check.txt").path().to_path_buf();
    let empty = dir.child("empty.txt").path().to_path_buf();

    let (result, _) = collect(
        service(WorkerSelection::Auto)
            .start_checksum_calculation(vec![check.clone(), empty.clone()], ResultCollector::default())
            .unwrap(),
    );

    let OperationResult::Checksum(sums) = result else {
        panic!("expected checksums");
    };
    assert_eq!(sums.len(), 2);
    let by_name = |name: &str| {
        sums.iter()
            .find(|(path, _)| path.file_name().unwrap() == name)
            .map(|(_, hash)| hash.to_string())
            .unwrap()
    };
    assert_eq!(by_name("check.txt"), "cbf43926");
    assert_eq!(by_name("empty.txt"), "00000000");
}

#[test]
fn sequential_and_parallel_agree() {
    let dir = TempDir::new().unwrap();
    let files = fixture(&dir, 60);
    let mirror = TempDir::new().unwrap();
    for (i, file) in files.iter().enumerate().step_by(3) {
        let child = mirror.child(file.file_name().unwrap());
        if i % 2 == 0 {
            child.write_binary(&std::fs::read(file).unwrap()).unwrap();
        } else {
            child.write_str("changed").unwrap();
        }
    }

    let run = |worker: WorkerSelection| {
        let service = service(worker);
        let dupes = collect(service.start_duplicate_scan(files.clone(), ResultCollector::default()).unwrap());
        let sums = collect(service.start_checksum_calculation(files.clone(), ResultCollector::default()).unwrap());
        let compare = collect(
            service
                .start_external_comparison(files.clone(), mirror.path().to_path_buf(), ResultCollector::default())
                .unwrap(),
        );
        (dupes.0, sums.0, compare.0)
    };

    let sequential = run(WorkerSelection::Sequential);
    let parallel = run(WorkerSelection::Parallel);

    assert_eq!(sequential, parallel);
    let OperationResult::Compare(entries) = &sequential.2 else {
        panic!("expected comparison");
    };
    assert_eq!(entries.len(), 20);
    assert_eq!(entries.values().filter(|e| e.is_same).count(), 10);
}

#[test]
fn same_named_sources_compare_the_first_submitted() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let mirror = TempDir::new().unwrap();
    first.child("a.txt").write_str("kept in sync").unwrap();
    second.child("a.txt").write_str("edited elsewhere").unwrap();
    mirror.child("a.txt").write_str("kept in sync").unwrap();
    let files = vec![
        first.child("a.txt").path().to_path_buf(),
        second.child("a.txt").path().to_path_buf(),
    ];

    let run = |worker: WorkerSelection| {
        collect(
            service(worker)
                .start_external_comparison(files.clone(), mirror.path().to_path_buf(), ResultCollector::default())
                .unwrap(),
        )
    };
    let (sequential, seq_summary) = run(WorkerSelection::Sequential);
    let (parallel, par_summary) = run(WorkerSelection::Parallel);

    assert_eq!(sequential, parallel);
    let OperationResult::Compare(entries) = &sequential else {
        panic!("expected comparison");
    };
    assert_eq!(entries.len(), 1);
    assert!(entries["a.txt"].is_same);
    for summary in [&seq_summary, &par_summary] {
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(predicate::str::contains("a.txt").eval(&summary.errors[0]));
    }
}

/// Store that cancels a token once `after` fingerprints have been written
struct CancelAfter {
    inner: InMemoryCache,
    token: CancellationToken,
    after: usize,
    writes: AtomicUsize,
}

impl CacheStore for CancelAfter {
    fn get(&self, key: &Path) -> Result<Option<FingerprintRecord>, CacheError> {
        self.inner.get(key)
    }

    fn set(&self, record: FingerprintRecord) -> Result<(), CacheError> {
        self.inner.set(record)?;
        if self.writes.fetch_add(1, Ordering::SeqCst) + 1 == self.after {
            self.token.cancel();
        }
        Ok(())
    }

    fn invalidate(&self, key: &Path) -> Result<(), CacheError> {
        self.inner.invalidate(key)
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.inner.clear()
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        self.inner.stats()
    }

    fn prune_orphans(&self) -> Result<usize, CacheError> {
        self.inner.prune_orphans()
    }
}

fn cancelling_core(token: &CancellationToken, after: usize) -> Arc<HashCore> {
    let store = CancelAfter {
        inner: InMemoryCache::new(),
        token: token.clone(),
        after,
        writes: AtomicUsize::new(0),
    };
    Arc::new(HashCore::new(Arc::new(FingerprintCache::with_store(
        Box::new(store),
        CacheKind::Memory,
    ))))
}

/// Store that holds the writer of the `pause_at`-th fingerprint until released
struct PauseAt {
    inner: InMemoryCache,
    pause_at: usize,
    writes: AtomicUsize,
    reached: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl CacheStore for PauseAt {
    fn get(&self, key: &Path) -> Result<Option<FingerprintRecord>, CacheError> {
        self.inner.get(key)
    }

    fn set(&self, record: FingerprintRecord) -> Result<(), CacheError> {
        self.inner.set(record)?;
        if self.writes.fetch_add(1, Ordering::SeqCst) + 1 == self.pause_at {
            let _ = self.reached.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
        }
        Ok(())
    }

    fn invalidate(&self, key: &Path) -> Result<(), CacheError> {
        self.inner.invalidate(key)
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.inner.clear()
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        self.inner.stats()
    }

    fn prune_orphans(&self) -> Result<usize, CacheError> {
        self.inner.prune_orphans()
    }
}

/// Sequential service checking the token before every file, whose cache
/// pauses on the `pause_at`-th write. Returns the "paused" signal and the
/// release switch.
fn pausing_service(pause_at: usize) -> (HashService, Receiver<()>, Sender<()>) {
    let (reached_tx, reached_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = PauseAt {
        inner: InMemoryCache::new(),
        pause_at,
        writes: AtomicUsize::new(0),
        reached: Mutex::new(reached_tx),
        release: Mutex::new(release_rx),
    };
    let cache = FingerprintCache::with_store(Box::new(store), CacheKind::Memory);
    let config = ServiceConfig::default()
        .worker(WorkerSelection::Sequential)
        .cancel_check_interval(1);
    (HashService::new(Arc::new(cache), config), reached_rx, release_tx)
}

fn descriptors(files: &[PathBuf]) -> Vec<FileDescriptor> {
    files.iter().map(|f| FileDescriptor::snapshot(f).unwrap()).collect()
}

#[test]
fn sequential_cancellation_keeps_exactly_completed_files() {
    let dir = TempDir::new().unwrap();
    let files = fixture(&dir, 20);
    let token = CancellationToken::new();
    let worker = SequentialWorker::new(cancelling_core(&token, 5)).with_cancel_check_interval(1);

    let outcome = worker.run(&OperationRequest::checksum(descriptors(&files)), &token, &null_sender());

    let OperationResult::Checksum(sums) = &outcome.result else {
        panic!("expected checksums");
    };
    let expected: BTreeSet<PathBuf> = files[..5].iter().cloned().collect();
    assert_eq!(sums.keys().cloned().collect::<BTreeSet<_>>(), expected);
    assert!(outcome.summary.cancelled);
    assert!(!outcome.summary.success());
    assert!(outcome.summary.message.ends_with("(cancelled)"));
}

#[test]
fn parallel_cancellation_skips_unstarted_tasks() {
    let dir = TempDir::new().unwrap();
    let files = fixture(&dir, 20);
    let token = CancellationToken::new();
    let worker = ParallelWorker::new(cancelling_core(&token, 4)).with_pool_size(1);

    let outcome = worker.run(&OperationRequest::checksum(descriptors(&files)), &token, &null_sender());

    assert_eq!(outcome.result.len(), 4);
    assert!(outcome.summary.cancelled);
    assert_eq!(outcome.summary.succeeded, 4);
}

/// Cancels through the attached token after the first hashed file, then lets
/// the paused writer go on. Remembers every file it was told about.
#[derive(Default)]
struct CancelOnFirst {
    token: Option<CancellationToken>,
    release: Option<Sender<()>>,
    hashed: Vec<PathBuf>,
    result: Option<OperationResult>,
    finished: Option<(bool, OperationSummary)>,
}

impl OperationHandler for CancelOnFirst {
    fn attach(&mut self, token: CancellationToken) {
        self.token = Some(token);
    }

    fn on_file_hash(&mut self, path: &Path, _hash: Fingerprint, _size: u64) {
        self.hashed.push(path.to_path_buf());
        if let Some(token) = &self.token {
            token.cancel();
        }
        if let Some(release) = self.release.take() {
            let _ = release.send(());
        }
    }

    fn on_result(&mut self, result: OperationResult) {
        self.result = Some(result);
    }

    fn on_finished(&mut self, success: bool, summary: &OperationSummary) {
        self.finished = Some((success, summary.clone()));
    }
}

/// Records how an operation ended
#[derive(Default)]
struct Ending {
    result: Option<OperationResult>,
    finished: Option<(bool, OperationSummary)>,
}

impl OperationHandler for Ending {
    fn on_result(&mut self, result: OperationResult) {
        self.result = Some(result);
    }

    fn on_finished(&mut self, success: bool, summary: &OperationSummary) {
        self.finished = Some((success, summary.clone()));
    }
}

#[test]
fn partial_result_matches_reported_files() {
    let dir = TempDir::new().unwrap();
    let files = fixture(&dir, 300);
    let (service, _paused, release) = pausing_service(2);
    let handler = CancelOnFirst {
        release: Some(release),
        ..Default::default()
    };

    let handler = service
        .start_checksum_calculation(files.clone(), handler)
        .unwrap()
        .wait()
        .unwrap();

    let Some(OperationResult::Checksum(sums)) = handler.result else {
        panic!("expected checksums");
    };
    let reported: BTreeSet<PathBuf> = handler.hashed.into_iter().collect();
    assert_eq!(sums.keys().cloned().collect::<BTreeSet<_>>(), reported);
    assert_eq!(sums.len(), 2);
    let (success, summary) = handler.finished.unwrap();
    assert!(!success);
    assert!(summary.cancelled);
}

#[test]
fn missing_external_folder_reports_error() {
    let dir = TempDir::new().unwrap();
    let files = fixture(&dir, 2);

    let collector = service(WorkerSelection::Auto)
        .start_external_comparison(files, dir.path().join("no-backup"), ResultCollector::default())
        .unwrap()
        .wait()
        .unwrap();

    assert!(collector.result.is_none());
    assert_eq!(collector.errors.len(), 1);
    assert!(predicate::str::contains("no-backup").eval(&collector.errors[0]));
    assert!(!collector.summary.unwrap().success());
}

#[test]
fn unreadable_inputs_do_not_fail_the_batch() {
    let dir = TempDir::new().unwrap();
    let mut files = fixture(&dir, 3);
    files.push(dir.path().join("vanished.dat"));
    files.push(dir.path().to_path_buf());

    let (result, summary) = collect(
        service(WorkerSelection::Auto)
            .start_checksum_calculation(files, ResultCollector::default())
            .unwrap(),
    );

    assert_eq!(result.len(), 3);
    assert_eq!(summary.failed, 2);
    assert!(summary.success());
    assert!(summary.errors.iter().any(|e| predicate::str::contains("vanished.dat").eval(e)));
}

#[test]
fn concurrent_operations_share_the_cache() {
    let dir = TempDir::new().unwrap();
    let files = fixture(&dir, 30);
    let service = service(WorkerSelection::Parallel);

    let first = service
        .start_checksum_calculation(files.clone(), ResultCollector::default())
        .unwrap();
    let second = service
        .start_duplicate_scan(files.clone(), ResultCollector::default())
        .unwrap();
    let (sums, _) = collect(first);
    let (_, summary) = collect(second);

    assert_eq!(sums.len(), 30);
    assert!(summary.success());
    assert!(service.core().files_read() <= 60);

    let reads = service.core().files_read();
    let (_, again) = collect(service.start_checksum_calculation(files, ResultCollector::default()).unwrap());
    assert_eq!(service.core().files_read(), reads);
    assert_eq!(again.cache_hits, 30);
}

#[test]
fn service_cancel_reaches_running_operations() {
    let dir = TempDir::new().unwrap();
    let files = fixture(&dir, 200);
    let (service, paused, release) = pausing_service(5);
    let handle = service
        .start_checksum_calculation(files.clone(), Ending::default())
        .unwrap();

    paused.recv().unwrap();
    assert_eq!(service.active_operations(), 1);
    service.cancel();
    service.cancel();
    release.send(()).unwrap();
    let handler = handle.wait().unwrap();

    let (success, summary) = handler.finished.unwrap();
    assert!(!success);
    assert!(summary.cancelled);
    assert!(handler.result.unwrap().len() < files.len());
    assert_eq!(service.active_operations(), 0);
}
