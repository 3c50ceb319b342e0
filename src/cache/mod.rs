//! # Last-known-good state cache.
//!
//! - [`CategoryState`]: per-category snapshot handed to observers.
//! - [`StateCache`]: the store itself, with change-notification listeners.

mod entry;
mod state;

pub use entry::{CategoryState, UnavailableReason};
pub use state::{ApplyOutcome, StateCache, SubscriptionId, ValueListener};
