//! # Fetcher: the wire-client boundary.
//!
//! [`Fetcher`] is the capability the coordinator consumes; the crate ships
//! no HTTP client. Hosts implement it against their Redfish wire layer
//! (authenticated requests, response parsing) and hand the coordinator an
//! `Arc<dyn Fetcher>`.
//!
//! ## Contract
//! - [`fetch`](Fetcher::fetch) returns the parsed [`Payload`] for one
//!   category, or a typed [`FetchError`]. The payload's variant must match
//!   the requested category; a mismatch is treated as a malformed response.
//! - [`invoke_command`](Fetcher::invoke_command) executes one control
//!   [`Action`]. Errors are returned verbatim to the dispatcher's caller
//!   and never retried.
//! - Implementations should be cancellation-safe: the coordinator wraps
//!   every call in a bounded timeout and may drop the future on shutdown.
//!
//! ## Example
//! ```no_run
//! use async_trait::async_trait;
//! use bmcpoll::{Action, CategoryId, FetchError, Fetcher, Payload};
//!
//! struct RedfishClient { /* http session, credentials, ... */ }
//!
//! #[async_trait]
//! impl Fetcher for RedfishClient {
//!     async fn fetch(&self, category: CategoryId) -> Result<Payload, FetchError> {
//!         // GET the category's endpoint, parse into the matching variant
//!         Err(FetchError::Unsupported { message: category.to_string() })
//!     }
//!
//!     async fn invoke_command(&self, action: &Action) -> Result<(), FetchError> {
//!         // POST the action to the command endpoint
//!         let _ = action;
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::actions::Action;
use crate::categories::{CategoryId, Payload};
use crate::error::FetchError;

/// Asynchronous boundary to the BMC wire client.
///
/// The coordinator treats implementations as opaque: it bounds each call
/// with a timeout, serializes fetches per category, and caps total
/// concurrency, but performs no retries of its own beyond the polling
/// schedule.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Fetches and parses one category's data group.
    async fn fetch(&self, category: CategoryId) -> Result<Payload, FetchError>;

    /// Executes one control action against the BMC's command surface.
    async fn invoke_command(&self, action: &Action) -> Result<(), FetchError>;
}
