//! Coordinator events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the scheduler, fetch tasks, and
//! the action dispatcher.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the scheduler loop, per-fetch tasks, the dispatcher,
//!   and `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: the coordinator's subscriber listener, which fans out to
//!   the [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
