//! Caller-side callbacks.

use crate::core::hasher::Fingerprint;
use crate::core::operation::{CancellationToken, OperationKindTag, OperationResult, OperationSummary};
use crate::events::{Event, HashEvent, HashProgress, OperationEvent};
use std::path::Path;
use uuid::Uuid;

/// Callbacks for one operation.
///
/// Invoked on the service's relay thread, never on a worker thread, and
/// never concurrently. Every method has a no-op default.
pub trait OperationHandler: Send + 'static {
    /// Receives the operation's token before any other callback
    fn attach(&mut self, _token: CancellationToken) {}

    fn on_started(&mut self, _id: Uuid, _kind: OperationKindTag, _total_files: usize, _total_bytes: u64) {}

    fn on_progress(&mut self, _progress: &HashProgress) {}

    fn on_file_hash(&mut self, _path: &Path, _hash: Fingerprint, _size: u64) {}

    fn on_file_error(&mut self, _path: &Path, _message: &str) {}

    /// Called at most once, with a partial result if cancelled
    fn on_result(&mut self, _result: OperationResult) {}

    /// Always the last callback
    fn on_finished(&mut self, _success: bool, _summary: &OperationSummary) {}

    /// The operation could not run at all
    fn on_error(&mut self, _message: &str) {}
}

impl OperationHandler for () {}

pub(crate) fn dispatch<H: OperationHandler>(handler: &mut H, event: Event) {
    match event {
        Event::Hash(HashEvent::Progress(progress)) => handler.on_progress(&progress),
        Event::Hash(HashEvent::FileHashed { path, hash, size }) => handler.on_file_hash(&path, hash, size),
        Event::Hash(HashEvent::Error { path, message }) => handler.on_file_error(&path, &message),
        Event::Operation(OperationEvent::Started {
            id,
            kind,
            total_files,
            total_bytes,
        }) => handler.on_started(id, kind, total_files, total_bytes),
        Event::Operation(OperationEvent::Result(result)) => handler.on_result(result),
        Event::Operation(OperationEvent::Finished { success, summary }) => handler.on_finished(success, &summary),
        Event::Operation(OperationEvent::Error { message }) => handler.on_error(&message),
    }
}
