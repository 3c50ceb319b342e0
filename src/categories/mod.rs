//! Pollable data groups: identities, payload shapes, and the registry.
//!
//! This module groups the data model for everything the coordinator polls:
//! - [`CategoryId`], [`CadenceClass`], [`Category`] — identity, cadence, and
//!   per-category merge behavior
//! - [`Payload`] and its typed contents — the closed union of parsed values
//! - [`CategoryRegistry`] — the fixed, ordered category set built at
//!   coordinator construction

mod category;
mod payload;
mod registry;

pub use category::{replace, CadenceClass, Category, CategoryId, MergeFn};
pub use payload::{
    ChassisInfo, FanMode, FanReading, Health, IndicatorLed, LicenseState, LldpState, ManagerInfo,
    NetworkProtocols, NtpState, Payload, PostCode, PowerReading, PowerState, SystemInfo,
    TemperatureReading, ThermalReport,
};
pub use registry::CategoryRegistry;
