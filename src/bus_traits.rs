// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the traits that need to be implemented by the types
//! that read counters from the device bus and publish the computed flows.

use crate::{DeviceClass, DeviceInstance, Error, FlowTotals, MetricPath};

/**
This trait needs to be implemented by the type that gives access to the
device bus.

Read more about why this is necessary [here][crate#the-busreader-and-resultsink-traits].

<details>
<summary>Example implementation on top of a cached bus monitor:</summary>

```ignore
impl kwh_counters::BusReader for Monitor {
    fn instances(&self, class: DeviceClass) -> Result<Vec<DeviceInstance>, Error> {
        let services = self.services().map_err(|e| Error::bus_unavailable(e.to_string()))?;
        Ok(services
            .into_iter()
            .filter(|name| DeviceClass::from_service_name(name) == Some(class))
            .map(DeviceInstance::new)
            .collect())
    }

    fn value(&self, instance: &DeviceInstance, path: &MetricPath) -> Result<Option<f64>, Error> {
        Ok(self
            .cached_value(instance.service_name(), path.as_str())
            .and_then(|v| v.as_f64()))
    }
}
```

</details>
*/
pub trait BusReader {
    /// Returns the instances of `class` that are currently on the bus.
    fn instances(&self, class: DeviceClass) -> Result<Vec<DeviceInstance>, Error>;

    /// Returns the current value of `path` on `instance`, or `None` if the
    /// device doesn't publish it right now.
    fn value(&self, instance: &DeviceInstance, path: &MetricPath) -> Result<Option<f64>, Error>;
}

/// This trait needs to be implemented by the type that exposes the flow
/// totals of each completed cycle to other consumers.
pub trait ResultSink {
    /// Publishes the totals of one cycle.
    fn publish(&mut self, totals: &FlowTotals) -> Result<(), Error>;
}

/// A device appearing on or disappearing from the bus.
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceEvent {
    Appeared {
        instance: DeviceInstance,
        class: DeviceClass,
    },
    Disappeared {
        instance: DeviceInstance,
    },
}

impl DeviceEvent {
    /// Creates a `DeviceEvent::Appeared` from a full service name.
    ///
    /// Returns `None` for services that don't belong to any known device
    /// class.
    pub fn appeared(service_name: &str) -> Option<DeviceEvent> {
        DeviceClass::from_service_name(service_name).map(|class| DeviceEvent::Appeared {
            instance: DeviceInstance::new(service_name),
            class,
        })
    }

    pub fn disappeared(service_name: &str) -> DeviceEvent {
        DeviceEvent::Disappeared {
            instance: DeviceInstance::new(service_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_events() {
        assert_eq!(
            DeviceEvent::appeared("com.victronenergy.vebus.ttyO1"),
            Some(DeviceEvent::Appeared {
                instance: DeviceInstance::from("com.victronenergy.vebus.ttyO1"),
                class: DeviceClass::VeBus,
            })
        );
        assert_eq!(DeviceEvent::appeared("com.victronenergy.settings"), None);
        assert_eq!(
            DeviceEvent::disappeared("com.victronenergy.battery.ttyO2"),
            DeviceEvent::Disappeared {
                instance: DeviceInstance::from("com.victronenergy.battery.ttyO2"),
            }
        );
    }
}
