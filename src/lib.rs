// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# kWh Counters

This is a library for turning the cumulative energy counters of the devices in
an off-grid or grid-tied power system (inverter/chargers, PV inverters, solar
chargers and battery monitors) into the energy that flowed between the grid,
the genset, the PV installation, the battery and the consumers.

## The `BusReader` and `ResultSink` traits

The library doesn't know how to talk to the devices or where to publish its
results.  Instead it uses traits to interact with them.

To read counters, a type implementing the [`BusReader`] trait is needed, which
lists the devices of a [`DeviceClass`] and reads a single value from a device.
The results of every cycle are handed to a type implementing [`ResultSink`].

## Delta tracking

A [`DeltaTracker`] keeps the last value of every tracked counter and computes
the energy transferred since then:

- a counter that went down (after a restart or an overflow) contributes zero,
- a device seen for the first time contributes zero, and its value becomes the
  baseline for the next cycle,
- devices of the same class are summed.

## Roles

The [`RoleRegistry`] decides which device feeds which part of the
decomposition: the most recently appeared inverter/charger is the primary
unit, and PV inverters are split by their position on the AC side.

## Flow decomposition

The [`FlowDecomposer`] relabels the AC-input counters of the primary unit into
grid and genset flows, using the configured [`AcInputs`], and splits the PV
production into energy to the battery, the grid and the consumers.  The
result is a [`FlowTotals`] value with nine flows.

## Scheduling

The [`Scheduler`] runs the cycle at a fixed period, and applies device
events between cycles.
*/

mod bus_traits;
pub use bus_traits::{BusReader, DeviceEvent, ResultSink};

mod config;
pub use config::{AcInputs, ChannelRole, Config, TrackedPaths};

mod device_class;
pub use device_class::{DeviceClass, DeviceInstance, MetricPath, PvPosition, POSITION_PATH};

mod error;
pub use error::{Error, ErrorKind};

mod flows;
pub use flows::{FlowDecomposer, FlowName, FlowTotals, RawFlow, RawFlows, RelabelTable, RoleDeltas};

pub mod paths;

mod roles;
pub use roles::{DeviceRole, RoleRegistry};

mod scheduler;
pub use scheduler::Scheduler;

mod simulated;
pub use simulated::SimulatedBus;

mod tracker;
pub use tracker::{CounterRegression, DeltaTracker, Deltas, Readings};

#[cfg(test)]
mod test_utils;
