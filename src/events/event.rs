//! # Runtime events emitted by the coordinator.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Fetch lifecycle**: one event per completed scheduling decision
//!   (started, succeeded, failed, timed out)
//! - **Availability transitions**: a category crossing into or out of the
//!   observable "available" state, or being retired for good
//! - **Burst/action flow**: action dispatch outcomes and the burst window
//!   opening and closing
//! - **Runtime**: shutdown progress and subscriber-side incidents
//!
//! The [`Event`] struct carries optional metadata such as the category,
//! action label, failure counts, and timing.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::categories::CategoryId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of coordinator events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Fetch lifecycle ===
    /// A fetch was submitted for a category (permit acquired).
    ///
    /// Sets: `category`, `at`, `seq`.
    FetchStarted,

    /// A fetch completed and its payload was applied to the cache.
    ///
    /// Sets: `category`, `duration_ms`, `at`, `seq`.
    FetchSucceeded,

    /// A fetch completed with a typed error.
    ///
    /// Sets: `category`, `reason` (error label + message), `failures`
    /// (consecutive count after this attempt), `at`, `seq`.
    FetchFailed,

    /// A fetch exceeded its bounded timeout (always followed by
    /// `FetchFailed` for the same attempt).
    ///
    /// Sets: `category`, `timeout_ms`, `at`, `seq`.
    FetchTimedOut,

    // === Availability transitions ===
    /// A category crossed into the unavailable state (threshold reached,
    /// or immediately on an authentication failure).
    ///
    /// Sets: `category`, `reason`, `failures`, `at`, `seq`.
    CategoryUnavailable,

    /// A category returned an unsupported error and will not be polled
    /// again for the life of the coordinator. Published once.
    ///
    /// Sets: `category`, `reason`, `at`, `seq`.
    CategoryRetired,

    /// A previously unavailable category became available again.
    ///
    /// Sets: `category`, `at`, `seq`.
    CategoryRecovered,

    // === Burst / action flow ===
    /// A control action was accepted by the BMC.
    ///
    /// Sets: `action`, `at`, `seq`.
    ActionDispatched,

    /// A control action was rejected; the error went back to the caller.
    ///
    /// Sets: `action`, `reason`, `at`, `seq`.
    ActionFailed,

    /// The burst window opened or was extended.
    ///
    /// Sets: `action`, `duration_ms` (window length), `count` (total
    /// activations so far), `at`, `seq`.
    BurstActivated,

    /// The burst window lapsed; cadences reverted to their base intervals.
    ///
    /// Sets: `at`, `seq`.
    BurstExpired,

    /// One or more categories were forced due out of cycle.
    ///
    /// Sets: `category` (one event per category), `at`, `seq`.
    RefreshForced,

    // === Runtime ===
    /// Shutdown was requested; no fetch result is applied past this point.
    ///
    /// Sets: `at`, `seq`.
    ShutdownRequested,

    /// The scheduler loop exited and released its resources.
    ///
    /// Sets: `at`, `seq`.
    Stopped,

    /// A subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (subscriber name + cause), `at`, `seq`.
    SubscriberOverflow,

    /// A subscriber panicked during event processing.
    ///
    /// Sets: `reason` (subscriber name + panic info), `at`, `seq`.
    SubscriberPanicked,
}

impl EventKind {
    /// True for subscriber-side incident events (overflow, panic).
    ///
    /// Incidents caused while processing an incident are never re-reported,
    /// so a broken subscriber cannot feed the bus back into itself.
    pub fn is_incident(&self) -> bool {
        matches!(
            self,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

/// Coordinator event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Category the event concerns, if applicable.
    pub category: Option<CategoryId>,
    /// Action label (see `Action::as_label`), if applicable.
    pub action: Option<&'static str>,
    /// Human-readable reason (error text, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Consecutive failure count after the attempt, if applicable.
    pub failures: Option<u32>,
    /// Fetch timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Elapsed or window duration in milliseconds (compact).
    pub duration_ms: Option<u32>,
    /// Occurrence count, where the kind tracks one (burst activations).
    pub count: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            category: None,
            action: None,
            reason: None,
            failures: None,
            timeout_ms: None,
            duration_ms: None,
            count: None,
        }
    }

    /// Attaches the category the event concerns.
    #[inline]
    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    /// Attaches an action label.
    #[inline]
    pub fn with_action(mut self, action: &'static str) -> Self {
        self.action = Some(action);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a consecutive failure count.
    #[inline]
    pub fn with_failures(mut self, n: u32) -> Self {
        self.failures = Some(n);
        self
    }

    /// Attaches a timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an elapsed/window duration (stored as milliseconds).
    #[inline]
    pub fn with_duration(mut self, d: Duration) -> Self {
        self.duration_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an occurrence count.
    #[inline]
    pub fn with_count(mut self, n: u64) -> Self {
        self.count = Some(n);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, cause: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} cause={cause}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
