//! # Typed payloads for each pollable category.
//!
//! [`Payload`] is a closed tagged union with one variant per
//! [`CategoryId`](super::CategoryId). The fetcher parses raw BMC responses
//! into these values; the coordinator forwards them opaquely and relies only
//! on equality (for change detection) and the variant tag (to guard against
//! a fetcher handing back the wrong shape).
//!
//! The shapes mirror the data groups a Redfish-style controller exposes:
//! live power/thermal telemetry, protocol toggles, and slow-moving inventory
//! (firmware versions, license, chassis identity).

use super::category::CategoryId;

/// Chassis or system power state as reported by the BMC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
    PoweringOn,
    PoweringOff,
}

/// Live power reading: state plus consumption where the BMC reports it.
#[derive(Clone, Debug, PartialEq)]
pub struct PowerReading {
    pub state: PowerState,
    /// Present draw in watts, if the platform exposes a power meter.
    pub watts: Option<f64>,
}

/// One temperature probe.
#[derive(Clone, Debug, PartialEq)]
pub struct TemperatureReading {
    pub sensor: String,
    pub celsius: f64,
}

/// One fan tachometer.
#[derive(Clone, Debug, PartialEq)]
pub struct FanReading {
    pub fan: String,
    pub rpm: u32,
}

/// Thermal telemetry group: all temperature and fan readings in one fetch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThermalReport {
    pub temperatures: Vec<TemperatureReading>,
    pub fans: Vec<FanReading>,
}

/// BMC fan control mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FanMode {
    Standard,
    FullSpeed,
    Optimal,
    HeavyIo,
}

/// BIOS POST code snooped by the BMC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostCode {
    pub code: u16,
}

/// Rolled-up health as reported by Redfish `Status.Health`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Health {
    Ok,
    Warning,
    Critical,
}

/// Chassis identification LED state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndicatorLed {
    Off,
    Lit,
    Blinking,
}

/// Static system inventory.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemInfo {
    pub model: String,
    pub serial: String,
    pub bios_version: String,
    pub health: Health,
    pub indicator_led: IndicatorLed,
}

/// Chassis state, including the intrusion latch.
#[derive(Clone, Debug, PartialEq)]
pub struct ChassisInfo {
    pub health: Health,
    pub intruded: bool,
}

/// BMC (manager) identity and health.
#[derive(Clone, Debug, PartialEq)]
pub struct ManagerInfo {
    pub firmware_version: String,
    pub health: Health,
}

/// NTP client configuration on the BMC.
#[derive(Clone, Debug, PartialEq)]
pub struct NtpState {
    pub enabled: bool,
    pub servers: Vec<String>,
}

/// LLDP advertisement state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LldpState {
    pub enabled: bool,
}

/// OEM feature license state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LicenseState {
    pub activated: bool,
}

/// Enablement of each management protocol the BMC serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkProtocols {
    pub http: bool,
    pub ssh: bool,
    pub ipmi: bool,
    pub snmp: bool,
}

/// Tagged union of every category's parsed value.
///
/// The variant set is closed at compile time; the registry enumerates the
/// same set, so the scheduler can reject a payload whose tag does not match
/// the category it was fetched for (treated as a malformed response).
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Power(PowerReading),
    Thermal(ThermalReport),
    FanMode(FanMode),
    PostSnoop(PostCode),
    System(SystemInfo),
    Chassis(ChassisInfo),
    Manager(ManagerInfo),
    Ntp(NtpState),
    Lldp(LldpState),
    License(LicenseState),
    NetworkProtocol(NetworkProtocols),
}

impl Payload {
    /// Returns the category this payload belongs to.
    pub fn category(&self) -> CategoryId {
        match self {
            Payload::Power(_) => CategoryId::Power,
            Payload::Thermal(_) => CategoryId::Thermal,
            Payload::FanMode(_) => CategoryId::FanMode,
            Payload::PostSnoop(_) => CategoryId::PostSnoop,
            Payload::System(_) => CategoryId::System,
            Payload::Chassis(_) => CategoryId::Chassis,
            Payload::Manager(_) => CategoryId::Manager,
            Payload::Ntp(_) => CategoryId::Ntp,
            Payload::Lldp(_) => CategoryId::Lldp,
            Payload::License(_) => CategoryId::License,
            Payload::NetworkProtocol(_) => CategoryId::NetworkProtocol,
        }
    }
}
