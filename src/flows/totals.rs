// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The directional energy flows published after every cycle.

use std::fmt::Display;

/// The name of one of the published energy flows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlowName {
    GridToConsumers,
    GridToBattery,
    GensetToConsumers,
    GensetToBattery,
    PvToBattery,
    PvToConsumers,
    PvToGrid,
    BatteryToConsumers,
    BatteryToGrid,
}

impl FlowName {
    pub const ALL: [FlowName; 9] = [
        FlowName::GridToConsumers,
        FlowName::GridToBattery,
        FlowName::GensetToConsumers,
        FlowName::GensetToBattery,
        FlowName::PvToBattery,
        FlowName::PvToConsumers,
        FlowName::PvToGrid,
        FlowName::BatteryToConsumers,
        FlowName::BatteryToGrid,
    ];

    /// Returns the path the flow is published on.
    pub fn path(&self) -> &'static str {
        match self {
            FlowName::GridToConsumers => "/GridToConsumers",
            FlowName::GridToBattery => "/GridToBattery",
            FlowName::GensetToConsumers => "/GensetToConsumers",
            FlowName::GensetToBattery => "/GensetToBattery",
            FlowName::PvToBattery => "/PvToBattery",
            FlowName::PvToConsumers => "/PvToConsumers",
            FlowName::PvToGrid => "/PvToGrid",
            FlowName::BatteryToConsumers => "/BatteryToConsumers",
            FlowName::BatteryToGrid => "/BatteryToGrid",
        }
    }
}

impl Display for FlowName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.path()[1..])
    }
}

/// The energy that flowed in each direction during one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlowTotals {
    pub grid_to_consumers: f64,
    pub grid_to_battery: f64,
    pub genset_to_consumers: f64,
    pub genset_to_battery: f64,
    pub pv_to_battery: f64,
    pub pv_to_consumers: f64,
    pub pv_to_grid: f64,
    pub battery_to_consumers: f64,
    pub battery_to_grid: f64,
}

impl FlowTotals {
    pub fn get(&self, name: FlowName) -> f64 {
        match name {
            FlowName::GridToConsumers => self.grid_to_consumers,
            FlowName::GridToBattery => self.grid_to_battery,
            FlowName::GensetToConsumers => self.genset_to_consumers,
            FlowName::GensetToBattery => self.genset_to_battery,
            FlowName::PvToBattery => self.pv_to_battery,
            FlowName::PvToConsumers => self.pv_to_consumers,
            FlowName::PvToGrid => self.pv_to_grid,
            FlowName::BatteryToConsumers => self.battery_to_consumers,
            FlowName::BatteryToGrid => self.battery_to_grid,
        }
    }

    /// Returns an iterator over all flows, in the order of [`FlowName::ALL`].
    pub fn iter(&self) -> impl Iterator<Item = (FlowName, f64)> + '_ {
        FlowName::ALL.into_iter().map(|name| (name, self.get(name)))
    }
}

impl Display for FlowTotals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}
