//! # Control actions dispatched to the BMC.
//!
//! [`Action`] is the closed set of control requests the coordinator can
//! forward to the fetcher's command surface: power/reset transitions,
//! identification LED, protocol toggles, fan mode, and boot source.
//!
//! Each action knows which categories its side effects touch
//! ([`Action::affected_categories`]); a successful dispatch forces those
//! burst-eligible categories due immediately so the next scheduler pass
//! re-fetches them without waiting out their interval.
//!
//! Actions are **not** idempotent-safe to repeat blindly (toggling a switch
//! twice reverts it), so dispatch never retries.

use crate::categories::{CategoryId, FanMode, IndicatorLed};

/// Management protocol served by the BMC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Ssh,
    Ipmi,
    Snmp,
}

impl Protocol {
    /// Stable lowercase name for logs and events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Ssh => "ssh",
            Protocol::Ipmi => "ipmi",
            Protocol::Snmp => "snmp",
        }
    }
}

/// First boot device override.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootSource {
    None,
    Pxe,
    Hdd,
    Cd,
    Usb,
    BiosSetup,
}

/// One control request against the BMC.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Power the system on.
    PowerOn,
    /// Immediate (hard) power off.
    PowerOff,
    /// ACPI-mediated shutdown.
    GracefulShutdown,
    /// ACPI-mediated restart.
    GracefulRestart,
    /// Hard reset without OS involvement.
    ForceRestart,
    /// Restart the BMC itself (the host keeps running).
    BmcRestart,
    /// Deliver a non-maskable interrupt to the host.
    SendNmi,
    /// Clear the chassis intrusion latch.
    ResetIntrusion,
    /// Set the identification LED.
    SetIndicatorLed(IndicatorLed),
    /// Enable or disable one management protocol.
    SetProtocolEnabled(Protocol, bool),
    /// Select the BMC fan control mode.
    SetFanMode(FanMode),
    /// Override the first boot device.
    SetBootSource(BootSource),
}

impl Action {
    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            Action::PowerOn => "power_on",
            Action::PowerOff => "power_off",
            Action::GracefulShutdown => "graceful_shutdown",
            Action::GracefulRestart => "graceful_restart",
            Action::ForceRestart => "force_restart",
            Action::BmcRestart => "bmc_restart",
            Action::SendNmi => "send_nmi",
            Action::ResetIntrusion => "reset_intrusion",
            Action::SetIndicatorLed(_) => "set_indicator_led",
            Action::SetProtocolEnabled(..) => "set_protocol_enabled",
            Action::SetFanMode(_) => "set_fan_mode",
            Action::SetBootSource(_) => "set_boot_source",
        }
    }

    /// Categories whose data this action is known to affect.
    ///
    /// The dispatcher forces the burst-eligible ones due immediately after a
    /// successful dispatch; static affected categories keep their cadence
    /// (hosts can call `force_refresh` when they want them sooner).
    pub fn affected_categories(&self) -> &'static [CategoryId] {
        match self {
            Action::PowerOn
            | Action::PowerOff
            | Action::GracefulShutdown
            | Action::GracefulRestart
            | Action::ForceRestart => &[CategoryId::Power, CategoryId::PostSnoop],
            Action::BmcRestart => &[CategoryId::Manager],
            Action::SendNmi => &[CategoryId::Power],
            Action::ResetIntrusion => &[CategoryId::Chassis],
            Action::SetIndicatorLed(_) => &[CategoryId::System],
            Action::SetProtocolEnabled(..) => &[CategoryId::NetworkProtocol],
            Action::SetFanMode(_) => &[CategoryId::FanMode, CategoryId::Thermal],
            Action::SetBootSource(_) => &[CategoryId::System],
        }
    }
}
