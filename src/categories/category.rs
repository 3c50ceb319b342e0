//! # Category identities and descriptors.
//!
//! A [`Category`] describes one logically distinct group of pollable BMC
//! data: its identity, cadence class, whether burst mode may accelerate it,
//! and the pure merge function that folds a fresh payload into the cached
//! representation.
//!
//! ## Rules
//! - The category set is **closed**: [`CategoryId`] enumerates every group
//!   at compile time; no dynamic registration during a run.
//! - Static categories are never burst-accelerated regardless of the
//!   `burst_eligible` flag (enforced by the burst window, and the standard
//!   registry sets the flag false for them anyway).

use super::payload::Payload;

/// Identity of one pollable data group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CategoryId {
    /// System power state and consumption.
    Power,
    /// Temperature and fan telemetry.
    Thermal,
    /// Active BMC fan control mode.
    FanMode,
    /// BIOS POST code snooping.
    PostSnoop,
    /// System inventory (model, serial, BIOS version, LED).
    System,
    /// Chassis health and intrusion latch.
    Chassis,
    /// BMC firmware and health.
    Manager,
    /// NTP configuration.
    Ntp,
    /// LLDP advertisement state.
    Lldp,
    /// OEM license activation.
    License,
    /// Management protocol enablement (HTTP/SSH/IPMI/SNMP).
    NetworkProtocol,
}

impl CategoryId {
    /// Every category, in the standard polling order.
    pub const ALL: [CategoryId; 11] = [
        CategoryId::Power,
        CategoryId::Thermal,
        CategoryId::FanMode,
        CategoryId::PostSnoop,
        CategoryId::System,
        CategoryId::Chassis,
        CategoryId::Manager,
        CategoryId::Ntp,
        CategoryId::Lldp,
        CategoryId::License,
        CategoryId::NetworkProtocol,
    ];

    /// Returns the stable kebab-case identifier used in logs and events.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryId::Power => "power",
            CategoryId::Thermal => "thermal",
            CategoryId::FanMode => "fan-mode",
            CategoryId::PostSnoop => "post-snoop",
            CategoryId::System => "system",
            CategoryId::Chassis => "chassis",
            CategoryId::Manager => "manager",
            CategoryId::Ntp => "ntp",
            CategoryId::Lldp => "lldp",
            CategoryId::License => "license",
            CategoryId::NetworkProtocol => "network-protocol",
        }
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cadence class determining a category's base polling interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CadenceClass {
    /// User-visible state that must react quickly (polled at the scan
    /// interval; first in line for burst acceleration).
    Fast,
    /// Regular telemetry polled at the scan interval.
    Normal,
    /// Slow-moving inventory polled at the static interval; never bursts.
    Static,
}

/// Pure function folding a fresh payload into the cached representation.
///
/// Receives the previously cached value (if any) and the newly fetched
/// payload, and returns what the cache should store. The default is
/// last-write-wins ([`replace`]).
pub type MergeFn = fn(Option<Payload>, Payload) -> Payload;

/// Default merge: the fresh payload replaces whatever was cached.
pub fn replace(_prev: Option<Payload>, fresh: Payload) -> Payload {
    fresh
}

/// Descriptor for one pollable data group.
#[derive(Clone, Copy, Debug)]
pub struct Category {
    /// Unique identity.
    pub id: CategoryId,
    /// Base cadence class.
    pub cadence: CadenceClass,
    /// Whether burst mode may accelerate this category. Meaningless for
    /// Static categories, which the burst window refuses to accelerate.
    pub burst_eligible: bool,
    /// Merge function applied on every successful fetch.
    pub merge: MergeFn,
}

impl Category {
    /// Creates a descriptor with the default replace merge.
    pub fn new(id: CategoryId, cadence: CadenceClass, burst_eligible: bool) -> Self {
        Self {
            id,
            cadence,
            burst_eligible,
            merge: replace,
        }
    }

    /// Overrides the merge function.
    pub fn with_merge(mut self, merge: MergeFn) -> Self {
        self.merge = merge;
        self
    }
}
