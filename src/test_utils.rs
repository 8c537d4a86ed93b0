// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains features
//! that are shared by all tests of the crate.
//!
//! - the `MockBus` type, which implements the `BusReader` trait on top of a
//!   map of values that tests can change.
//! - the `RecordingSink` type, which implements the `ResultSink` trait and
//!   remembers everything that was published.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::{BusReader, DeviceClass, DeviceInstance, Error, FlowTotals, MetricPath, ResultSink};

#[derive(Default)]
struct MockBusState {
    devices: BTreeMap<DeviceInstance, BTreeMap<MetricPath, f64>>,
    failing: bool,
}

/// A `BusReader` backed by an in-memory map.
///
/// Clones share the same state, so a test can keep a handle to a bus that it
/// has passed on to a `Scheduler`.
#[derive(Clone, Default)]
pub(crate) struct MockBus {
    state: Arc<Mutex<MockBusState>>,
}

impl MockBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a device without any values.
    pub(crate) fn with_instance(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .devices
            .entry(name.into())
            .or_default();
        self
    }

    pub(crate) fn with_value(self, name: &str, path: &str, value: f64) -> Self {
        self.set_value(name, path, value);
        self
    }

    /// Makes every call fail with a `BusUnavailable` error.
    pub(crate) fn failing(self) -> Self {
        self.set_failing(true);
        self
    }

    pub(crate) fn set_value(&self, name: &str, path: &str, value: f64) {
        self.state
            .lock()
            .unwrap()
            .devices
            .entry(name.into())
            .or_default()
            .insert(path.into(), value);
    }

    pub(crate) fn remove_instance(&self, name: &str) {
        self.state.lock().unwrap().devices.remove(name);
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }
}

impl BusReader for MockBus {
    fn instances(&self, class: DeviceClass) -> Result<Vec<DeviceInstance>, Error> {
        let state = self.state.lock().unwrap();
        if state.failing {
            return Err(Error::bus_unavailable("bus is gone"));
        }
        Ok(state
            .devices
            .keys()
            .filter(|i| DeviceClass::from_service_name(i.service_name()) == Some(class))
            .cloned()
            .collect())
    }

    fn value(&self, instance: &DeviceInstance, path: &MetricPath) -> Result<Option<f64>, Error> {
        let state = self.state.lock().unwrap();
        if state.failing {
            return Err(Error::bus_unavailable("bus is gone"));
        }
        Ok(state
            .devices
            .get(instance)
            .and_then(|values| values.get(path).copied()))
    }
}

/// A `ResultSink` that records the published totals.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    published: Arc<Mutex<Vec<FlowTotals>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn published(&self) -> Vec<FlowTotals> {
        self.published.lock().unwrap().clone()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

impl ResultSink for RecordingSink {
    fn publish(&mut self, totals: &FlowTotals) -> Result<(), Error> {
        if *self.failing.lock().unwrap() {
            return Err(Error::publish_failed("sink is gone"));
        }
        self.published.lock().unwrap().push(*totals);
        Ok(())
    }
}
