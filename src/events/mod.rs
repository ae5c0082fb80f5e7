//! # Events Module
//!
//! Message-passing progress reporting.
//!
//! ## Design
//! Workers emit events through channels; the orchestration service relays
//! them to the caller's handler on a dedicated thread, so any UI layer
//! (CLI, GUI, web) can subscribe without the engine doing UI work.
//!
//! ## Ordering
//! - `OperationEvent::Started` comes first and `OperationEvent::Finished`
//!   comes last, exactly once each.
//! - `OperationEvent::Result` is sent once, just before `Finished`. An
//!   operation that fails before a worker runs sends only
//!   `OperationEvent::Error` and `Finished`.
//! - The sequential worker emits per-file events in submission order; the
//!   parallel worker does not.
//! - `HashProgress::bytes_processed` never decreases within an operation.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Hash(HashEvent::Progress(p)) = event {
//!             println!("{}/{} files", p.current, p.total);
//!         }
//!     }
//! });
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
