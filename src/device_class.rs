// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `DeviceClass` enum, which represents the class of
//! a device on the bus, along with the identifiers for device instances and
//! the counters they expose.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::Display;

/// Represents the class of a device on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// An inverter/charger unit.
    VeBus,
    PvInverter,
    SolarCharger,
    /// A battery monitor.
    Battery,
}

impl DeviceClass {
    /// All known device classes, in a fixed order.
    pub const ALL: [DeviceClass; 4] = [
        DeviceClass::VeBus,
        DeviceClass::PvInverter,
        DeviceClass::SolarCharger,
        DeviceClass::Battery,
    ];

    /// Returns the prefix shared by the service names of all devices of this
    /// class.
    pub fn service_prefix(&self) -> &'static str {
        match self {
            DeviceClass::VeBus => "com.victronenergy.vebus",
            DeviceClass::PvInverter => "com.victronenergy.pvinverter",
            DeviceClass::SolarCharger => "com.victronenergy.solarcharger",
            DeviceClass::Battery => "com.victronenergy.battery",
        }
    }

    /// Classifies a full service name, like
    /// `com.victronenergy.pvinverter.output`.
    ///
    /// Returns `None` for services that don't belong to any known class.
    pub fn from_service_name(name: &str) -> Option<DeviceClass> {
        Self::ALL.into_iter().find(|class| {
            let prefix = class.service_prefix();
            name == prefix
                || name
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

impl Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceClass::VeBus => write!(f, "VeBus"),
            DeviceClass::PvInverter => write!(f, "PvInverter"),
            DeviceClass::SolarCharger => write!(f, "SolarCharger"),
            DeviceClass::Battery => write!(f, "Battery"),
        }
    }
}

/// Identifies a single device on the bus, by its service name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceInstance(String);

impl DeviceInstance {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self(service_name.into())
    }

    /// Returns the service name of the device.
    pub fn service_name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceInstance {
    fn from(service_name: &str) -> Self {
        Self::new(service_name)
    }
}

impl Borrow<str> for DeviceInstance {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for DeviceInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The bus path of a cumulative counter, like `/Energy/AcIn1ToAcOut`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricPath(String);

impl MetricPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MetricPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl Borrow<str> for MetricPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for MetricPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bus path of the position attribute of a PV inverter.
pub const POSITION_PATH: &str = "/Position";

/// Where on the AC side a PV inverter is connected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PvPosition {
    /// On the grid side of the inverter/charger.
    GridSide,
    /// On the output of the inverter/charger, next to the consumers.
    OutputSide,
    /// On the genset side of the inverter/charger.
    GensetSide,
}

impl PvPosition {
    /// Converts a raw `/Position` reading.
    ///
    /// Returns `None` for anything other than 0, 1 or 2.
    pub fn from_reading(value: f64) -> Option<PvPosition> {
        if value.fract() != 0.0 {
            return None;
        }
        match value as i64 {
            0 => Some(PvPosition::GridSide),
            1 => Some(PvPosition::OutputSide),
            2 => Some(PvPosition::GensetSide),
            _ => None,
        }
    }
}

impl Display for PvPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PvPosition::GridSide => write!(f, "GridSide"),
            PvPosition::OutputSide => write!(f, "OutputSide"),
            PvPosition::GensetSide => write!(f, "GensetSide"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_service_name() {
        assert_eq!(
            DeviceClass::from_service_name("com.victronenergy.vebus.ttyO1"),
            Some(DeviceClass::VeBus)
        );
        assert_eq!(
            DeviceClass::from_service_name("com.victronenergy.pvinverter.output"),
            Some(DeviceClass::PvInverter)
        );
        assert_eq!(
            DeviceClass::from_service_name("com.victronenergy.battery"),
            Some(DeviceClass::Battery)
        );
        assert_eq!(
            DeviceClass::from_service_name("com.victronenergy.solarcharger.ttyO2"),
            Some(DeviceClass::SolarCharger)
        );
        assert_eq!(
            DeviceClass::from_service_name("com.victronenergy.vebusx.ttyO1"),
            None
        );
        assert_eq!(
            DeviceClass::from_service_name("com.victronenergy.settings"),
            None
        );
    }

    #[test]
    fn test_pv_position() {
        assert_eq!(PvPosition::from_reading(0.0), Some(PvPosition::GridSide));
        assert_eq!(PvPosition::from_reading(1.0), Some(PvPosition::OutputSide));
        assert_eq!(PvPosition::from_reading(2.0), Some(PvPosition::GensetSide));
        assert_eq!(PvPosition::from_reading(3.0), None);
        assert_eq!(PvPosition::from_reading(-1.0), None);
        assert_eq!(PvPosition::from_reading(1.5), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(DeviceClass::PvInverter.to_string(), "PvInverter");
        assert_eq!(
            DeviceInstance::from("com.victronenergy.vebus.ttyO1").to_string(),
            "com.victronenergy.vebus.ttyO1"
        );
        assert_eq!(MetricPath::from("/Yield/System").as_str(), "/Yield/System");
    }
}
