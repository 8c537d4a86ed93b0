// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A full read of the tracked counters of all devices on the bus.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::TrackedPaths;
use crate::{BusReader, DeviceClass, DeviceInstance, Error, MetricPath};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct InstanceReadings {
    pub(crate) class: DeviceClass,
    pub(crate) values: BTreeMap<MetricPath, f64>,
}

/// The counter values read from every device instance in one cycle.
///
/// A `Readings` instance is also what a [`DeltaTracker`][crate::DeltaTracker]
/// keeps as its snapshot between two cycles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Readings {
    instances: BTreeMap<DeviceInstance, InstanceReadings>,
}

impl Readings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every tracked path of every instance of every tracked class
    /// from the bus.
    ///
    /// Paths that an instance doesn't currently publish are left out.  Any
    /// failing bus call fails the whole read.
    pub fn collect<B: BusReader>(bus: &B, tracked: &TrackedPaths) -> Result<Self, Error> {
        let mut readings = Self::new();
        for (class, paths) in tracked.iter() {
            for instance in bus.instances(class)? {
                for path in paths {
                    match bus.value(&instance, path)? {
                        Some(value) if value.is_finite() => {
                            readings.insert(instance.clone(), class, path.clone(), value);
                        }
                        Some(value) => {
                            debug!("Ignoring non-finite value {value} for {instance}{path}");
                        }
                        None => {}
                    }
                }
            }
        }
        Ok(readings)
    }

    /// Records a value read from `instance`.
    pub fn insert(
        &mut self,
        instance: DeviceInstance,
        class: DeviceClass,
        path: MetricPath,
        value: f64,
    ) -> &mut Self {
        let entry = self
            .instances
            .entry(instance)
            .or_insert_with(|| InstanceReadings {
                class,
                values: BTreeMap::new(),
            });
        entry.class = class;
        entry.values.insert(path, value);
        self
    }

    /// Returns the value of `path` on `instance`, if it was read.
    pub fn value(&self, instance: &str, path: &str) -> Option<f64> {
        self.instances
            .get(instance)
            .and_then(|r| r.values.get(path).copied())
    }

    /// Returns the class of `instance`, if any value was read from it.
    pub fn class(&self, instance: &str) -> Option<DeviceClass> {
        self.instances.get(instance).map(|r| r.class)
    }

    /// Removes all values of `instance`, returning true if there were any.
    pub fn remove(&mut self, instance: &str) -> bool {
        self.instances.remove(instance).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Returns an iterator over the instances of `class` that values were
    /// read from.
    pub(crate) fn instances_of(
        &self,
        class: DeviceClass,
    ) -> impl Iterator<Item = (&DeviceInstance, &InstanceReadings)> {
        self.instances.iter().filter(move |(_, r)| r.class == class)
    }
}
