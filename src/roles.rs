// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Assignment of device instances to the roles that the flow decomposition
//! draws its inputs from.

use std::collections::BTreeMap;
use std::fmt::Display;

use tracing::{debug, info, warn};

use crate::device_class::{PvPosition, POSITION_PATH};
use crate::{BusReader, DeviceClass, DeviceInstance, MetricPath};

/// The logical function of a device instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceRole {
    /// The inverter/charger unit that represents the AC system.
    PrimaryVeBus,
    PvGridSide,
    PvOutputSide,
    PvGensetSide,
    SolarChargers,
    BatteryMonitors,
}

impl DeviceRole {
    pub const ALL: [DeviceRole; 6] = [
        DeviceRole::PrimaryVeBus,
        DeviceRole::PvGridSide,
        DeviceRole::PvOutputSide,
        DeviceRole::PvGensetSide,
        DeviceRole::SolarChargers,
        DeviceRole::BatteryMonitors,
    ];

    /// Returns the class of the devices that can hold this role.
    pub fn class(&self) -> DeviceClass {
        match self {
            DeviceRole::PrimaryVeBus => DeviceClass::VeBus,
            DeviceRole::PvGridSide | DeviceRole::PvOutputSide | DeviceRole::PvGensetSide => {
                DeviceClass::PvInverter
            }
            DeviceRole::SolarChargers => DeviceClass::SolarCharger,
            DeviceRole::BatteryMonitors => DeviceClass::Battery,
        }
    }

    /// Returns true if at most one instance can hold this role at a time.
    pub fn is_singleton(&self) -> bool {
        *self == DeviceRole::PrimaryVeBus
    }
}

impl From<PvPosition> for DeviceRole {
    fn from(position: PvPosition) -> Self {
        match position {
            PvPosition::GridSide => DeviceRole::PvGridSide,
            PvPosition::OutputSide => DeviceRole::PvOutputSide,
            PvPosition::GensetSide => DeviceRole::PvGensetSide,
        }
    }
}

impl Display for DeviceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceRole::PrimaryVeBus => write!(f, "PrimaryVeBus"),
            DeviceRole::PvGridSide => write!(f, "PvGridSide"),
            DeviceRole::PvOutputSide => write!(f, "PvOutputSide"),
            DeviceRole::PvGensetSide => write!(f, "PvGensetSide"),
            DeviceRole::SolarChargers => write!(f, "SolarChargers"),
            DeviceRole::BatteryMonitors => write!(f, "BatteryMonitors"),
        }
    }
}

#[derive(Clone, Debug)]
struct Assignment {
    class: DeviceClass,
    role: Option<DeviceRole>,
}

/// Keeps track of the online device instances and their roles.
#[derive(Clone, Debug, Default)]
pub struct RoleRegistry {
    assignments: BTreeMap<DeviceInstance, Assignment>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device that appeared on the bus, and returns the role it
    /// was assigned.
    ///
    /// - An inverter/charger becomes the primary unit, replacing the previous
    ///   one.
    /// - A PV inverter gets the role matching its `/Position`, which is read
    ///   from `bus` once, here.  PV inverters with an unusable position get no
    ///   role.
    /// - Solar chargers and battery monitors join their group role.
    ///
    /// If the instance is already registered, the new assignment replaces the
    /// old one.
    pub fn device_appeared<B: BusReader>(
        &mut self,
        bus: &B,
        instance: DeviceInstance,
        class: DeviceClass,
    ) -> Option<DeviceRole> {
        let role = match class {
            DeviceClass::VeBus => Some(DeviceRole::PrimaryVeBus),
            DeviceClass::PvInverter => Self::pv_role(bus, &instance),
            DeviceClass::SolarCharger => Some(DeviceRole::SolarChargers),
            DeviceClass::Battery => Some(DeviceRole::BatteryMonitors),
        };

        if let Some(role) = role.filter(DeviceRole::is_singleton) {
            for (other, assignment) in self.assignments.iter_mut() {
                if *other != instance && assignment.role == Some(role) {
                    info!("{instance} replaces {other} as {role}.");
                    assignment.role = None;
                }
            }
        }

        let previous = self
            .assignments
            .insert(instance.clone(), Assignment { class, role });
        match previous {
            Some(previous) if previous.role != role => {
                debug!(
                    "{instance} re-announced: role changed from {:?} to {:?}.",
                    previous.role, role
                );
            }
            Some(_) => {}
            None => match role {
                Some(role) => info!("{instance} appeared with role {role}."),
                None => info!("{instance} appeared without a role."),
            },
        }

        role
    }

    fn pv_role<B: BusReader>(bus: &B, instance: &DeviceInstance) -> Option<DeviceRole> {
        let position = match bus.value(instance, &MetricPath::from(POSITION_PATH)) {
            Ok(Some(value)) => value,
            Ok(None) => {
                warn!("{instance} has no {POSITION_PATH}, it won't be used.");
                return None;
            }
            Err(err) => {
                warn!("Can't read {POSITION_PATH} of {instance}: {err}");
                return None;
            }
        };
        match PvPosition::from_reading(position) {
            Some(position) => Some(position.into()),
            None => {
                warn!("{instance} has an unknown position {position}, it won't be used.");
                None
            }
        }
    }

    /// Removes a device that disappeared from the bus from its role.
    ///
    /// If it was the primary unit, there is no primary unit until another
    /// inverter/charger appears.
    pub fn device_disappeared(&mut self, instance: &str) -> Option<DeviceRole> {
        let removed = self.assignments.remove(instance)?;
        match removed.role {
            Some(role) => info!("{instance} disappeared, it no longer holds role {role}."),
            None => info!("{instance} disappeared."),
        }
        removed.role
    }

    /// Returns the holders of every role of `class` that has at least one
    /// holder.
    pub fn roles_for(&self, class: DeviceClass) -> BTreeMap<DeviceRole, Vec<DeviceInstance>> {
        let mut roles: BTreeMap<DeviceRole, Vec<DeviceInstance>> = BTreeMap::new();
        for (instance, assignment) in &self.assignments {
            if assignment.class != class {
                continue;
            }
            if let Some(role) = assignment.role {
                roles.entry(role).or_default().push(instance.clone());
            }
        }
        roles
    }

    /// Returns the instances currently holding `role`.
    pub fn holders(&self, role: DeviceRole) -> impl Iterator<Item = &DeviceInstance> {
        self.assignments
            .iter()
            .filter(move |(_, a)| a.role == Some(role))
            .map(|(instance, _)| instance)
    }

    /// Returns the primary inverter/charger unit, if there is one.
    pub fn primary(&self) -> Option<&DeviceInstance> {
        self.holders(DeviceRole::PrimaryVeBus).next()
    }

    /// Returns the role of `instance`, if it is online and has one.
    pub fn role_of(&self, instance: &str) -> Option<DeviceRole> {
        self.assignments.get(instance).and_then(|a| a.role)
    }
}
