//! # Event bus for broadcasting coordinator events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (scheduler, fetch
//! tasks, dispatcher).
//!
//! ```text
//! Publishers (many):                  Subscriber (one):
//!   Scheduler  ──┐
//!   Fetch task ──┼─────► Bus ───────► subscriber_listener ────► SubscriberSet
//!   Dispatcher ──┘  (broadcast chan)    (in Coordinator)
//! ```
//!
//! The coordinator uses a single subscriber that fans events out to
//! user-supplied [`Subscribe`](crate::Subscribe) implementations.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: one ring buffer stores recent events for all
//!   receivers; slow receivers get `RecvError::Lagged(n)` and skip the `n`
//!   oldest items.
//! - **No persistence**: events are lost if no subscriber is attached at
//!   send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for coordinator events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender); multiple
/// publishers can publish concurrently and subscribers receive clones of
/// each event.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to ≥ 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// If there are no receivers, the event is dropped; this function still
    /// returns immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes subsequent events.
    ///
    /// Each call creates an independent receiver; a receiver only gets
    /// events sent after it subscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
