//! # Coordinator configuration.
//!
//! Provides [`CoordinatorConfig`], the centralized settings for the polling
//! coordinator: the three cadence intervals, the burst window, the outbound
//! concurrency cap, and the failure threshold.
//!
//! ## Validation
//! Every field has a hard range. [`CoordinatorConfig::validate`] rejects the
//! first out-of-range field with [`CoordinatorError::ConfigOutOfRange`];
//! values are **never** silently clamped. Validation runs at coordinator
//! construction, so a bad configuration is fatal to startup.
//!
//! | field              | range    | default |
//! |--------------------|----------|---------|
//! | `scan_interval`    | 10–300s  | 30s     |
//! | `burst_interval`   | 1–30s    | 5s      |
//! | `burst_duration`   | 10–300s  | 60s     |
//! | `static_interval`  | 60–900s  | 300s    |
//! | `max_concurrent`   | 1–10     | 5       |
//! | `failure_threshold`| 1–10     | 3       |
//!
//! `bus_capacity` is observability plumbing, not a polling knob; it is
//! clamped to a minimum of 1 by the bus rather than validated.

use std::time::Duration;

use crate::error::CoordinatorError;

/// Permitted range for `scan_interval`, seconds.
pub const SCAN_INTERVAL_RANGE: (u64, u64) = (10, 300);
/// Permitted range for `burst_interval`, seconds.
pub const BURST_INTERVAL_RANGE: (u64, u64) = (1, 30);
/// Permitted range for `burst_duration`, seconds.
pub const BURST_DURATION_RANGE: (u64, u64) = (10, 300);
/// Permitted range for `static_interval`, seconds.
pub const STATIC_INTERVAL_RANGE: (u64, u64) = (60, 900);
/// Permitted range for `max_concurrent`.
pub const MAX_CONCURRENT_RANGE: (u64, u64) = (1, 10);
/// Permitted range for `failure_threshold`.
pub const FAILURE_THRESHOLD_RANGE: (u64, u64) = (1, 10);

/// Upper bound on any single fetch; see [`CoordinatorConfig::fetch_timeout`].
const FETCH_TIMEOUT_CAP: Duration = Duration::from_secs(10);

/// Global configuration for the polling coordinator.
///
/// Defines:
/// - **Cadences**: scan (Fast/Normal categories), static, and burst intervals
/// - **Burst window**: how long a user action accelerates polling
/// - **Throttling**: the sole bound protecting the BMC from request storms
/// - **Failure policy**: consecutive failures before a category is marked
///   unavailable to observers
///
/// All fields are public; construct with `CoordinatorConfig::default()` and
/// override what you need. The coordinator calls [`validate`](Self::validate)
/// at construction and refuses to start on any out-of-range value.
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Base polling interval for Fast and Normal cadence categories.
    pub scan_interval: Duration,

    /// Accelerated interval used for burst-eligible categories while the
    /// burst window is active.
    pub burst_interval: Duration,

    /// How long a successful action keeps burst mode active. Re-triggering
    /// an action extends the window rather than stacking it.
    pub burst_duration: Duration,

    /// Polling interval for Static cadence categories (firmware versions,
    /// license state, protocol configuration). Never burst-accelerated.
    pub static_interval: Duration,

    /// Maximum number of simultaneously in-flight fetches against the BMC.
    ///
    /// This is the only throttle protecting the controller; it holds even
    /// when every category becomes due at once (startup, burst activation).
    pub max_concurrent: usize,

    /// Consecutive transient failures before a category is reported
    /// unavailable. The coordinator keeps retrying on the normal schedule;
    /// no additional backoff is applied since cadence already bounds load.
    pub failure_threshold: u32,

    /// Capacity of the event bus ring buffer (observability only).
    ///
    /// Slow subscribers that lag more than `bus_capacity` events receive
    /// `Lagged` and skip older items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,
}

impl CoordinatorConfig {
    /// Checks every field against its permitted range.
    ///
    /// Returns the first violation as
    /// [`CoordinatorError::ConfigOutOfRange`] naming the field. Out-of-range
    /// configuration is fatal; nothing is clamped.
    pub fn validate(&self) -> Result<(), CoordinatorError> {
        check_secs("scan_interval", self.scan_interval, SCAN_INTERVAL_RANGE)?;
        check_secs("burst_interval", self.burst_interval, BURST_INTERVAL_RANGE)?;
        check_secs("burst_duration", self.burst_duration, BURST_DURATION_RANGE)?;
        check_secs(
            "static_interval",
            self.static_interval,
            STATIC_INTERVAL_RANGE,
        )?;
        check_count(
            "max_concurrent",
            self.max_concurrent as u64,
            MAX_CONCURRENT_RANGE,
        )?;
        check_count(
            "failure_threshold",
            u64::from(self.failure_threshold),
            FAILURE_THRESHOLD_RANGE,
        )?;
        Ok(())
    }

    /// Returns the scheduler tick period.
    ///
    /// The loop ticks at the smallest interval it may ever need to honor:
    /// one second, or the burst interval when that is shorter.
    pub fn tick_interval(&self) -> Duration {
        self.burst_interval.min(Duration::from_secs(1))
    }

    /// Returns the bounded timeout for one fetch of a category whose
    /// effective interval is `effective`.
    ///
    /// A fetch may never occupy more than half its own cadence slot, and
    /// never more than 10s regardless of cadence.
    pub fn fetch_timeout(&self, effective: Duration) -> Duration {
        FETCH_TIMEOUT_CAP.min(effective / 2).max(Duration::from_millis(500))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for CoordinatorConfig {
    /// Default configuration:
    ///
    /// - `scan_interval = 30s`
    /// - `burst_interval = 5s`
    /// - `burst_duration = 60s`
    /// - `static_interval = 300s`
    /// - `max_concurrent = 5`
    /// - `failure_threshold = 3`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(30),
            burst_interval: Duration::from_secs(5),
            burst_duration: Duration::from_secs(60),
            static_interval: Duration::from_secs(300),
            max_concurrent: 5,
            failure_threshold: 3,
            bus_capacity: 1024,
        }
    }
}

fn check_secs(
    field: &'static str,
    value: Duration,
    (min, max): (u64, u64),
) -> Result<(), CoordinatorError> {
    let secs = value.as_secs();
    // Sub-second fractions above the max also count as out of range.
    if secs < min || secs > max || (secs == max && value.subsec_nanos() != 0) {
        return Err(CoordinatorError::ConfigOutOfRange {
            field,
            value: secs,
            min,
            max,
        });
    }
    Ok(())
}

fn check_count(
    field: &'static str,
    value: u64,
    (min, max): (u64, u64),
) -> Result<(), CoordinatorError> {
    if value < min || value > max {
        return Err(CoordinatorError::ConfigOutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
