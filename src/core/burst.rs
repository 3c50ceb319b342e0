//! # Burst window: temporary cadence acceleration after user actions.
//!
//! After a successful control action the BMC's state is in motion (power
//! transitions, fan ramp), so burst-eligible categories poll at the burst
//! interval until the window lapses.
//!
//! ## Rules
//! - Re-activation while active **extends** the window from now; windows
//!   never stack or accumulate.
//! - Static categories are never accelerated, eligible flag or not.
//! - Expiry is detected by the scheduler tick, which reverts cadences and
//!   publishes a single `BurstExpired`.

use std::time::Duration;

use tokio::time::Instant;

use crate::categories::{CadenceClass, Category};
use crate::config::CoordinatorConfig;

/// Single shared burst window over all burst-eligible categories.
#[derive(Debug, Default)]
pub(crate) struct BurstWindow {
    until: Option<Instant>,
    activations: u64,
}

impl BurstWindow {
    pub(crate) fn new() -> Self {
        Self {
            until: None,
            activations: 0,
        }
    }

    /// Opens the window (or extends it, if already open) to `now + duration`.
    pub(crate) fn activate(&mut self, now: Instant, duration: Duration) {
        self.until = Some(now + duration);
        self.activations += 1;
    }

    /// Total activations since construction (informational).
    pub(crate) fn activations(&self) -> u64 {
        self.activations
    }

    /// True while the window is open.
    pub(crate) fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    /// Clears a lapsed window. Returns true exactly once per expiry.
    pub(crate) fn expire_if_lapsed(&mut self, now: Instant) -> bool {
        match self.until {
            Some(until) if now >= until => {
                self.until = None;
                true
            }
            _ => false,
        }
    }
}

/// Effective polling interval for one category right now.
///
/// Static categories always poll at the static interval. Burst-eligible
/// categories poll at the burst interval while the window is open (never
/// slower than their base interval); everything else polls at the scan
/// interval.
pub(crate) fn effective_interval(
    category: &Category,
    config: &CoordinatorConfig,
    burst_active: bool,
) -> Duration {
    match category.cadence {
        CadenceClass::Static => config.static_interval,
        _ if burst_active && category.burst_eligible => {
            config.burst_interval.min(config.scan_interval)
        }
        _ => config.scan_interval,
    }
}
