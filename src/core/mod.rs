//! # Core runtime: coordinator, scheduler, dispatch, burst, gate.
//!
//! - [`Coordinator`]: the public facade (lifecycle, reads, dispatch)
//! - `Scheduler`: the single polling loop and sole cache writer
//! - `ActionDispatcher`: one-shot control request forwarding
//! - `BurstWindow` / `Gate`: cadence acceleration and the concurrency cap

mod burst;
mod coordinator;
mod dispatch;
mod gate;
mod scheduler;

pub use coordinator::Coordinator;
