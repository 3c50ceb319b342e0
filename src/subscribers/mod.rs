//! # Event subscribers for coordinator observability.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out, and a built-in [`LogWriter`] for handling events broadcast
//! through the [`Bus`](crate::events::Bus).
//!
//! ```text
//! Event flow:
//!   Scheduler/Dispatcher ── publish(Event) ──► Bus ──► subscriber listener
//!                                                         │
//!                                                   SubscriberSet::emit
//!                                                   ┌──────┼──────┐
//!                                                   ▼      ▼      ▼
//!                                               LogWriter Metrics ...
//! ```

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
