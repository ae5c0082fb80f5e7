//! Progress accounting shared by the workers.

use crate::events::{Event, EventSender, HashEvent, HashProgress};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Counters for one operation.
///
/// `bytes_processed` never decreases: additions that would wrap around are
/// clamped to `u64::MAX` and logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub current: usize,
    pub total: usize,
    pub bytes_processed: u64,
    pub total_bytes: u64,
    pub cancelled: bool,
}

impl ProgressState {
    pub fn new(total: usize, total_bytes: u64) -> Self {
        Self {
            total,
            total_bytes,
            ..Default::default()
        }
    }

    /// Add bytes with the overflow guard; returns the new counter value
    pub fn add_bytes(&mut self, bytes: u64) -> u64 {
        self.bytes_processed = match self.bytes_processed.checked_add(bytes) {
            Some(next) => next,
            None => {
                warn!(
                    processed = self.bytes_processed,
                    adding = bytes,
                    "Byte counter would overflow, clamping"
                );
                u64::MAX
            }
        };
        self.bytes_processed
    }

    /// Record one finished file (hashed or skipped)
    pub fn complete_file(&mut self, size: u64) {
        self.current = self.current.saturating_add(1);
        self.add_bytes(size);
    }

    /// Byte count while a file of the operation is partly read
    pub fn with_partial(&self, partial: u64) -> u64 {
        self.bytes_processed.saturating_add(partial)
    }
}

/// Emits progress events whose byte counts never go backwards.
pub struct ProgressTracker {
    state: ProgressState,
    last_emitted: u64,
    events: EventSender,
}

impl ProgressTracker {
    pub fn new(total: usize, total_bytes: u64, events: EventSender) -> Self {
        Self::from_state(ProgressState::new(total, total_bytes), events)
    }

    /// Resume from an existing state
    pub fn from_state(state: ProgressState, events: EventSender) -> Self {
        Self {
            last_emitted: state.bytes_processed,
            state,
            events,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn mark_cancelled(&mut self) {
        self.state.cancelled = true;
    }

    /// Report bytes read so far inside the current file
    pub fn partial(&mut self, name: &str, bytes_in_file: u64) {
        let bytes = self.state.with_partial(bytes_in_file);
        self.emit(name, bytes);
    }

    /// Report that a file is done
    pub fn file_done(&mut self, name: &str, size: u64) {
        self.state.complete_file(size);
        let bytes = self.state.bytes_processed;
        self.emit(name, bytes);
    }

    fn emit(&mut self, name: &str, bytes: u64) {
        self.last_emitted = self.last_emitted.max(bytes);
        self.events.send(Event::Hash(HashEvent::Progress(HashProgress {
            current: self.state.current,
            total: self.state.total,
            bytes_processed: self.last_emitted,
            total_bytes: self.state.total_bytes,
            current_name: name.to_string(),
        })));
    }
}
