// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A simulated device bus, for running the service without real devices.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::device_class::POSITION_PATH;
use crate::paths::{pvinverter, vebus};
use crate::{BusReader, DeviceClass, DeviceInstance, Error, MetricPath};

#[derive(Clone, Copy, Debug)]
struct Counter {
    value: f64,
    increment: f64,
}

#[derive(Debug, Default)]
struct SimulatedDevice {
    counters: BTreeMap<MetricPath, Counter>,
    attributes: BTreeMap<MetricPath, f64>,
}

/// A `BusReader` whose counters grow by a fixed increment on every call to
/// [`advance`][SimulatedBus::advance].
///
/// Clones share the same devices.
#[derive(Clone, Debug, Default)]
pub struct SimulatedBus {
    devices: Arc<Mutex<BTreeMap<DeviceInstance, SimulatedDevice>>>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bus with one inverter/charger and one PV inverter on its
    /// output.
    pub fn stock() -> Result<Self, Error> {
        const VEBUS: &str = "com.victronenergy.vebus.ttyO1";
        const PV: &str = "com.victronenergy.pvinverter.output";

        let bus = Self::new();
        for (path, increment) in [
            (vebus::AC_IN1_TO_INVERTER, 1.0),
            (vebus::AC_IN2_TO_INVERTER, 0.0),
            (vebus::AC_IN1_TO_AC_OUT, 10.0),
            (vebus::AC_IN2_TO_AC_OUT, 0.0),
            (vebus::INVERTER_TO_AC_IN1, 100.0),
            (vebus::INVERTER_TO_AC_IN2, 0.0),
            (vebus::AC_OUT_TO_AC_IN1, 1000.0),
            (vebus::AC_OUT_TO_AC_IN2, 0.0),
            (vebus::INVERTER_TO_AC_OUT, 10000.0),
            (vebus::OUT_TO_INVERTER, 5.0),
        ] {
            bus.add_counter(VEBUS, path, 0.0, increment)?;
        }
        bus.add_counter(PV, pvinverter::FORWARD, 0.0, 100000.0)?;
        bus.set_attribute(PV, POSITION_PATH, 1.0)?;
        Ok(bus)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<DeviceInstance, SimulatedDevice>> {
        self.devices.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_service_name(service_name: &str) -> Result<(), Error> {
        if DeviceClass::from_service_name(service_name).is_none() {
            return Err(Error::invalid_config(format!(
                "{service_name} doesn't belong to a known device class."
            )));
        }
        Ok(())
    }

    /// Adds a counter to a device, creating the device if needed.
    pub fn add_counter(
        &self,
        service_name: &str,
        path: &str,
        initial: f64,
        increment: f64,
    ) -> Result<(), Error> {
        Self::check_service_name(service_name)?;
        self.lock()
            .entry(service_name.into())
            .or_default()
            .counters
            .insert(
                path.into(),
                Counter {
                    value: initial,
                    increment,
                },
            );
        Ok(())
    }

    /// Sets a value that doesn't change on `advance`, like `/Position`.
    pub fn set_attribute(&self, service_name: &str, path: &str, value: f64) -> Result<(), Error> {
        Self::check_service_name(service_name)?;
        self.lock()
            .entry(service_name.into())
            .or_default()
            .attributes
            .insert(path.into(), value);
        Ok(())
    }

    /// Takes a device off the bus.
    pub fn remove(&self, service_name: &str) -> bool {
        self.lock().remove(service_name).is_some()
    }

    /// Resets a counter to zero, like a device restart does.
    pub fn reset_counter(&self, service_name: &str, path: &str) {
        if let Some(counter) = self
            .lock()
            .get_mut(service_name)
            .and_then(|d| d.counters.get_mut(path))
        {
            counter.value = 0.0;
        }
    }

    /// Increments every counter by its increment.
    pub fn advance(&self) {
        for device in self.lock().values_mut() {
            for counter in device.counters.values_mut() {
                counter.value += counter.increment;
            }
        }
    }
}

impl BusReader for SimulatedBus {
    fn instances(&self, class: DeviceClass) -> Result<Vec<DeviceInstance>, Error> {
        Ok(self
            .lock()
            .keys()
            .filter(|i| DeviceClass::from_service_name(i.service_name()) == Some(class))
            .cloned()
            .collect())
    }

    fn value(&self, instance: &DeviceInstance, path: &MetricPath) -> Result<Option<f64>, Error> {
        Ok(self.lock().get(instance).and_then(|device| {
            device
                .counters
                .get(path)
                .map(|c| c.value)
                .or_else(|| device.attributes.get(path).copied())
        }))
    }
}
