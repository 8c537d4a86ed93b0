// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Grouping of per-instance deltas by device role.

use std::collections::BTreeMap;

use crate::config::TrackedPaths;
use crate::{DeltaTracker, Deltas, DeviceRole, MetricPath, RoleRegistry};

/// The deltas of one cycle, summed over the holders of each role.
///
/// Every tracked path of a role's device class is present, with a value of
/// zero if the role has no holders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoleDeltas {
    roles: BTreeMap<DeviceRole, BTreeMap<MetricPath, f64>>,
}

impl RoleDeltas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups `deltas` by the roles in `registry`.
    pub fn group(deltas: &Deltas, registry: &RoleRegistry, tracked: &TrackedPaths) -> Self {
        let mut grouped = Self::new();
        for role in DeviceRole::ALL {
            let paths = tracked.paths(role.class());
            if paths.is_empty() {
                continue;
            }
            let sums = grouped.roles.entry(role).or_default();
            for path in paths {
                let sum = registry
                    .holders(role)
                    .filter_map(|holder| deltas.instance_delta(holder.service_name(), path.as_str()))
                    .sum::<f64>();
                sums.insert(path.clone(), sum);
            }
        }
        grouped
    }

    /// Same as [`group`][RoleDeltas::group], with the tracked paths of
    /// `tracker`.
    pub fn group_for(deltas: &Deltas, registry: &RoleRegistry, tracker: &DeltaTracker) -> Self {
        Self::group(deltas, registry, tracker.tracked_paths())
    }

    /// Sets the delta of `path` for `role`.
    pub fn insert(&mut self, role: DeviceRole, path: impl Into<MetricPath>, delta: f64) -> &mut Self {
        self.roles.entry(role).or_default().insert(path.into(), delta);
        self
    }

    pub fn get(&self, role: DeviceRole, path: &str) -> Option<f64> {
        self.roles.get(&role).and_then(|paths| paths.get(path).copied())
    }

    /// Returns all deltas of `role`.
    pub fn role(&self, role: DeviceRole) -> Option<&BTreeMap<MetricPath, f64>> {
        self.roles.get(&role)
    }
}
