//! Unbounded crossbeam channel carrying engine events from a worker to the
//! relay thread of its operation.
//!
//! Workers never wait on the relay: `send` returns immediately and drops the
//! event once the relay is gone.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Worker side of an operation's event stream; cloned into every task
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Queue an event for the relay
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Relay side of an operation's event stream
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Next event, or `None` once every sender is gone and the queue is drained
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Drain events until every sender is gone
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Constructor for an operation's event stream
pub struct EventChannel;

impl EventChannel {
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// Sender whose events go nowhere, for running a worker without a relay
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}
