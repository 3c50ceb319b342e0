//! # Per-category cache entries.
//!
//! [`CategoryState`] is both the cache's stored record and the owned
//! snapshot handed to observers (clone-on-read). A category that has never
//! been polled is represented by the [`CategoryState::never_polled`]
//! sentinel rather than absence, so `read()` always has something to
//! return.
//!
//! ## Rules
//! - `value` is retained across transient failures (stale-but-present);
//!   only a newer successful merge replaces it.
//! - `available` is the single flag observers should trust; the reason
//!   explains why it is false.

use std::time::SystemTime;

use crate::categories::{CategoryId, Payload};
use crate::error::FetchError;

/// Why a category is currently unavailable to observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnavailableReason {
    /// No fetch has completed yet (startup sentinel).
    NeverPolled,
    /// The consecutive-failure threshold was reached, or no value has ever
    /// been obtained.
    Degraded,
    /// The BMC rejected the credentials; surfaced immediately.
    AuthFailed,
    /// The BMC does not implement this category; permanent for this run.
    Unsupported,
}

impl UnavailableReason {
    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            UnavailableReason::NeverPolled => "never_polled",
            UnavailableReason::Degraded => "degraded",
            UnavailableReason::AuthFailed => "auth_failed",
            UnavailableReason::Unsupported => "unsupported",
        }
    }
}

/// State of one category as seen by observers.
///
/// Cloned out of the cache on every read; never a live reference, so reads
/// can never observe a partially applied update.
#[derive(Clone, Debug)]
pub struct CategoryState {
    /// Which category this entry describes.
    pub category: CategoryId,
    /// Last successfully merged payload; retained across transient failures.
    pub value: Option<Payload>,
    /// When the last successful fetch was applied.
    pub last_success_at: Option<SystemTime>,
    /// When the last fetch (success or failure) was applied.
    pub last_attempt_at: Option<SystemTime>,
    /// The failure from the most recent attempt, if it failed.
    pub last_error: Option<FetchError>,
    /// Consecutive failed attempts since the last success.
    pub consecutive_failures: u32,
    /// Whether observers should treat the value as usable.
    pub available: bool,
    /// Why `available` is false, when it is.
    pub unavailable_reason: Option<UnavailableReason>,
}

impl CategoryState {
    /// The sentinel returned before the first poll completes.
    pub fn never_polled(category: CategoryId) -> Self {
        Self {
            category,
            value: None,
            last_success_at: None,
            last_attempt_at: None,
            last_error: None,
            consecutive_failures: 0,
            available: false,
            unavailable_reason: Some(UnavailableReason::NeverPolled),
        }
    }

    /// True if at least one fetch has completed for this category.
    pub fn polled(&self) -> bool {
        self.last_attempt_at.is_some()
    }
}
