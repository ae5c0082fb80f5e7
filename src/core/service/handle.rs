//! Handle to a running operation.

use crate::core::operation::CancellationToken;
use crate::core::worker::panic_message;
use crate::error::{Result, WorkerError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use uuid::Uuid;

/// Service-side record of an operation that may still be running
#[derive(Debug)]
pub(crate) struct ActiveOperation {
    pub id: Uuid,
    pub token: CancellationToken,
    done: AtomicBool,
}

impl ActiveOperation {
    pub fn new(id: Uuid, token: CancellationToken) -> Self {
        Self {
            id,
            token,
            done: AtomicBool::new(false),
        }
    }

    pub fn mark_done(&self) {
        self.done.store(true, Ordering::SeqCst);
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

/// Returned by every `start_*` call.
///
/// Dropping the handle detaches the operation; it keeps running and the
/// handler still receives every callback.
#[derive(Debug)]
pub struct OperationHandle<H> {
    id: Uuid,
    token: CancellationToken,
    worker: Option<JoinHandle<()>>,
    relay: JoinHandle<H>,
}

impl<H> OperationHandle<H> {
    pub(crate) fn new(id: Uuid, token: CancellationToken, worker: Option<JoinHandle<()>>, relay: JoinHandle<H>) -> Self {
        Self {
            id,
            token,
            worker,
            relay,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Request cancellation; safe to call repeatedly or after completion
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether every callback, including `on_finished`, has been delivered
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished()) && self.relay.is_finished()
    }

    /// Block until the operation is over and hand the handler back
    pub fn wait(self) -> Result<H> {
        if let Some(worker) = self.worker {
            worker
                .join()
                .map_err(|payload| WorkerError::ThreadPanicked(panic_message(payload.as_ref())))?;
        }
        let handler = self
            .relay
            .join()
            .map_err(|payload| WorkerError::ThreadPanicked(panic_message(payload.as_ref())))?;
        Ok(handler)
    }
}
