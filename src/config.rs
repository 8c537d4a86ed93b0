// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for the counter service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

use crate::{paths, DeviceClass, Error, MetricPath};

/// What an AC input of the inverter/charger is connected to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelRole {
    Grid,
    Genset,
}

impl Display for ChannelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelRole::Grid => write!(f, "Grid"),
            ChannelRole::Genset => write!(f, "Genset"),
        }
    }
}

/// Assignment of the two AC inputs of the primary inverter/charger.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcInputs {
    pub ac_in_1: ChannelRole,
    pub ac_in_2: ChannelRole,
}

impl Default for AcInputs {
    fn default() -> Self {
        Self {
            ac_in_1: ChannelRole::Genset,
            ac_in_2: ChannelRole::Grid,
        }
    }
}

/// The counters that are tracked for each device class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedPaths(BTreeMap<DeviceClass, Vec<MetricPath>>);

impl TrackedPaths {
    pub fn new(paths: impl IntoIterator<Item = (DeviceClass, Vec<MetricPath>)>) -> Self {
        Self(paths.into_iter().collect())
    }

    /// Returns the tracked paths for `class`, which is empty for untracked
    /// classes.
    pub fn paths(&self, class: DeviceClass) -> &[MetricPath] {
        self.0.get(&class).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, class: DeviceClass, path: &str) -> bool {
        self.paths(class).iter().any(|p| p.as_str() == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeviceClass, &[MetricPath])> {
        self.0.iter().map(|(class, paths)| (*class, paths.as_slice()))
    }
}

impl Default for TrackedPaths {
    fn default() -> Self {
        let to_paths = |list: &[&str]| -> Vec<MetricPath> {
            list.iter().map(|p| MetricPath::from(*p)).collect()
        };
        Self::new([
            (DeviceClass::VeBus, to_paths(&paths::vebus::ALL)),
            (
                DeviceClass::SolarCharger,
                to_paths(&[paths::solarcharger::YIELD_SYSTEM]),
            ),
            (
                DeviceClass::PvInverter,
                to_paths(&[paths::pvinverter::FORWARD]),
            ),
            (
                DeviceClass::Battery,
                to_paths(&[
                    paths::battery::DISCHARGED_ENERGY,
                    paths::battery::CHARGED_ENERGY,
                ]),
            ),
        ])
    }
}

fn default_cycle_period_ms() -> u64 {
    1000
}

/// Configuration options for the counter service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Time between two consecutive cycles, in milliseconds.
    #[serde(default = "default_cycle_period_ms")]
    pub cycle_period_ms: u64,

    #[serde(default)]
    pub ac_inputs: AcInputs,

    #[serde(default)]
    pub tracked_paths: TrackedPaths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cycle_period_ms: default_cycle_period_ms(),
            ac_inputs: AcInputs::default(),
            tracked_paths: TrackedPaths::default(),
        }
    }
}

impl Config {
    /// Reads and validates a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_config(format!("Can't read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&raw)
    }

    /// Parses and validates a YAML configuration.
    pub fn from_yaml(raw: &str) -> Result<Self, Error> {
        let cfg: Self = serde_yaml::from_str(raw)
            .map_err(|e| Error::invalid_config(format!("Can't parse config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.cycle_period_ms == 0 {
            return Err(Error::invalid_config("cycle_period_ms must be positive."));
        }
        if self.ac_inputs.ac_in_1 == self.ac_inputs.ac_in_2 {
            return Err(Error::invalid_config(format!(
                "ac_in_1 and ac_in_2 can't both be {}.",
                self.ac_inputs.ac_in_1
            )));
        }
        for (class, paths) in self.tracked_paths.iter() {
            if paths.is_empty() {
                return Err(Error::invalid_config(format!(
                    "No tracked paths for device class {class}."
                )));
            }
        }
        Ok(())
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.cycle_period_ms)
    }
}
