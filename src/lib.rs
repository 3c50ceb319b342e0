//! # bmcpoll
//!
//! Polling coordinator for BMC management controllers (Redfish-style):
//! multi-cadence scheduling, burst acceleration after control actions, a
//! bounded fetch pipeline, a last-known-good state cache with change
//! listeners, and an event bus for observability.
//!
//! ```text
//!                         ┌───────────────────┐
//!        dispatch(action) │    Coordinator    │ read / subscribe
//!       ─────────────────►│     (facade)      │◄─────────────────
//!                         └─────────┬─────────┘
//!               ┌───────────────────┼────────────────────┐
//!               ▼                   ▼                    ▼
//!      ┌────────────────┐  ┌───────────────┐   ┌──────────────────┐
//!      │ActionDispatcher│  │   Scheduler   │──►│    StateCache    │
//!      │  (no retries)  │─►│  (one loop,   │   │ (last-known-good │
//!      └───────┬────────┘  │ sole writer)  │   │  + listeners)    │
//!              │           └───────┬───────┘   └──────────────────┘
//!              │            Gate ──┤ permits
//!              │                   ▼
//!              │           ┌───────────────┐        ┌─────────────┐
//!              └──────────►│    Fetcher    │        │ Bus ─► Subs │
//!                 commands │ (host-provided)│       │ (events)    │
//!                          └───────────────┘        └─────────────┘
//! ```
//!
//! ## What it does
//! - **Cadences**: Fast/Normal categories poll at the scan interval, Static
//!   ones at the static interval; a successful action opens a burst window
//!   that accelerates burst-eligible categories.
//! - **Bounded pipeline**: at most `max_concurrent` fetches in flight, one
//!   per category, each under a hard timeout.
//! - **Failure policy**: transient errors are absorbed up to a threshold
//!   (stale value retained), auth failures surface immediately, unsupported
//!   categories are retired for the run.
//! - **Observability**: every scheduling decision is published on a
//!   broadcast [`Bus`] and fanned out to [`Subscribe`] implementations with
//!   panic isolation.
//!
//! ## Quick start
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use bmcpoll::{
//!     Action, CategoryId, CategoryRegistry, Coordinator, CoordinatorConfig, FetchError, Fetcher,
//!     LogWriter, Payload,
//! };
//!
//! struct MyClient;
//!
//! #[async_trait]
//! impl Fetcher for MyClient {
//!     async fn fetch(&self, category: CategoryId) -> Result<Payload, FetchError> {
//!         todo!("GET and parse the category's Redfish endpoint")
//!     }
//!     async fn invoke_command(&self, action: &Action) -> Result<(), FetchError> {
//!         todo!("POST the action")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = Arc::new(Coordinator::new(
//!         Arc::new(MyClient),
//!         CoordinatorConfig::default(),
//!         CategoryRegistry::standard(),
//!         vec![Arc::new(LogWriter)],
//!     )?);
//!
//!     let runner = Arc::clone(&coordinator);
//!     let handle = tokio::spawn(async move { runner.run().await });
//!
//!     // ... read(), subscribe(), dispatch() from anywhere ...
//!     coordinator.dispatch(Action::PowerOn).await?;
//!
//!     coordinator.shutdown();
//!     handle.await??;
//!     Ok(())
//! }
//! ```
//!
//! ## Rules
//! - The scheduler is the **only** cache writer; reads never see torn state.
//! - Configuration is validated at construction and never clamped.
//! - Action errors go back to the caller verbatim; actions are never
//!   retried.
//! - Shutdown is cooperative: in-flight fetches are dropped, no result is
//!   applied afterwards, and `Stopped` is the final event.

mod actions;
mod cache;
mod categories;
mod config;
mod core;
mod error;
mod events;
mod fetcher;
mod subscribers;

pub use actions::{Action, BootSource, Protocol};
pub use cache::{ApplyOutcome, CategoryState, StateCache, SubscriptionId, UnavailableReason, ValueListener};
pub use categories::{
    replace, CadenceClass, Category, CategoryId, CategoryRegistry, ChassisInfo, FanMode,
    FanReading, Health, IndicatorLed, LicenseState, LldpState, ManagerInfo, MergeFn,
    NetworkProtocols, NtpState, Payload, PostCode, PowerReading, PowerState, SystemInfo,
    TemperatureReading, ThermalReport,
};
pub use config::{
    CoordinatorConfig, BURST_DURATION_RANGE, BURST_INTERVAL_RANGE, FAILURE_THRESHOLD_RANGE,
    MAX_CONCURRENT_RANGE, SCAN_INTERVAL_RANGE, STATIC_INTERVAL_RANGE,
};
pub use self::core::Coordinator;
pub use error::{CoordinatorError, FetchError};
pub use events::{Bus, Event, EventKind};
pub use fetcher::Fetcher;
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
