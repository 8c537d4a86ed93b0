// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The energy transferred during one cycle, per device class and per device
//! instance.

use std::collections::BTreeMap;

use crate::{DeviceClass, DeviceInstance, MetricPath};

/// A tracked counter that was found to be lower than in the previous cycle.
///
/// This happens when a device restarts or its counter overflows.  The delta
/// for such a counter is clamped to zero.
#[derive(Clone, Debug, PartialEq)]
pub struct CounterRegression {
    pub instance: DeviceInstance,
    pub path: MetricPath,
    pub previous: f64,
    pub current: f64,
}

/// The non-negative deltas of one cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Deltas {
    pub(super) classes: BTreeMap<DeviceClass, BTreeMap<MetricPath, f64>>,
    pub(super) instances: BTreeMap<DeviceInstance, BTreeMap<MetricPath, f64>>,
    pub(super) regressions: Vec<CounterRegression>,
}

impl Deltas {
    /// Returns the sum of the deltas of `path` over all instances of `class`.
    ///
    /// Every tracked path of a tracked class has a total, which is zero when
    /// no instance contributed to it.  Returns `None` for untracked paths.
    pub fn class_total(&self, class: DeviceClass, path: &str) -> Option<f64> {
        self.classes
            .get(&class)
            .and_then(|paths| paths.get(path).copied())
    }

    /// Returns the delta of `path` for a single instance, if it reported the
    /// path in this cycle.
    pub fn instance_delta(&self, instance: &str, path: &str) -> Option<f64> {
        self.instances
            .get(instance)
            .and_then(|paths| paths.get(path).copied())
    }

    /// Returns the counter regressions observed in this cycle.
    pub fn regressions(&self) -> &[CounterRegression] {
        &self.regressions
    }
}
