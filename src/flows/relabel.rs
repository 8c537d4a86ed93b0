// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Renaming of the generic AC-input counters of the primary inverter/charger
//! into grid and genset flows.

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::config::{AcInputs, ChannelRole, TrackedPaths};
use crate::paths::vebus;
use crate::{DeviceClass, Error, MetricPath};

/// A flow measured by the primary inverter/charger, after relabeling.
///
/// `Dc` is the battery bus, and `Consumers` is the AC output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RawFlow {
    GridToConsumers,
    GensetToConsumers,
    GridToDc,
    GensetToDc,
    ConsumersToGrid,
    ConsumersToGenset,
    DcToGrid,
    DcToGenset,
    DcToConsumers,
    ConsumersToDc,
}

impl RawFlow {
    fn to_consumers(role: ChannelRole) -> Self {
        match role {
            ChannelRole::Grid => RawFlow::GridToConsumers,
            ChannelRole::Genset => RawFlow::GensetToConsumers,
        }
    }

    fn to_dc(role: ChannelRole) -> Self {
        match role {
            ChannelRole::Grid => RawFlow::GridToDc,
            ChannelRole::Genset => RawFlow::GensetToDc,
        }
    }

    fn from_consumers(role: ChannelRole) -> Self {
        match role {
            ChannelRole::Grid => RawFlow::ConsumersToGrid,
            ChannelRole::Genset => RawFlow::ConsumersToGenset,
        }
    }

    fn from_dc(role: ChannelRole) -> Self {
        match role {
            ChannelRole::Grid => RawFlow::DcToGrid,
            ChannelRole::Genset => RawFlow::DcToGenset,
        }
    }
}

impl Display for RawFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The relabeled deltas of the primary inverter/charger.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawFlows(BTreeMap<RawFlow, f64>);

impl RawFlows {
    pub fn get(&self, flow: RawFlow) -> f64 {
        self.0.get(&flow).copied().unwrap_or_default()
    }
}

/// A declarative `(source path -> RawFlow)` table.
#[derive(Clone, Debug, PartialEq)]
pub struct RelabelTable {
    entries: Vec<(MetricPath, RawFlow)>,
}

impl RelabelTable {
    /// Builds the table for the given assignment of the AC inputs.
    pub fn new(ac_inputs: AcInputs) -> Self {
        let channels = [
            (
                ac_inputs.ac_in_1,
                vebus::AC_IN1_TO_AC_OUT,
                vebus::AC_IN1_TO_INVERTER,
                vebus::AC_OUT_TO_AC_IN1,
                vebus::INVERTER_TO_AC_IN1,
            ),
            (
                ac_inputs.ac_in_2,
                vebus::AC_IN2_TO_AC_OUT,
                vebus::AC_IN2_TO_INVERTER,
                vebus::AC_OUT_TO_AC_IN2,
                vebus::INVERTER_TO_AC_IN2,
            ),
        ];

        let mut entries = vec![];
        for (role, to_out, to_inverter, from_out, from_inverter) in channels {
            entries.push((to_out.into(), RawFlow::to_consumers(role)));
            entries.push((to_inverter.into(), RawFlow::to_dc(role)));
            entries.push((from_out.into(), RawFlow::from_consumers(role)));
            entries.push((from_inverter.into(), RawFlow::from_dc(role)));
        }
        entries.push((vebus::INVERTER_TO_AC_OUT.into(), RawFlow::DcToConsumers));
        entries.push((vebus::OUT_TO_INVERTER.into(), RawFlow::ConsumersToDc));

        Self { entries }
    }

    pub fn entries(&self) -> &[(MetricPath, RawFlow)] {
        &self.entries
    }

    /// Checks that every source path of the table is tracked for the
    /// inverter/charger class.
    pub fn validate(&self, tracked: &TrackedPaths) -> Result<(), Error> {
        let missing = self
            .entries
            .iter()
            .map(|(source, _)| source.as_str())
            .filter(|source| !tracked.contains(DeviceClass::VeBus, source))
            .collect::<Vec<_>>();

        if !missing.is_empty() {
            return Err(Error::invalid_config(format!(
                "Paths {missing:?} must be tracked for {}.",
                DeviceClass::VeBus
            )));
        }
        Ok(())
    }

    /// Renames the source paths in `deltas` to their flows.
    ///
    /// Fails if any source path of the table is missing from `deltas`.
    pub fn apply(&self, deltas: &BTreeMap<MetricPath, f64>) -> Result<RawFlows, Error> {
        let mut flows = BTreeMap::new();
        for (source, flow) in &self.entries {
            let value = deltas.get(source).copied().ok_or_else(|| {
                Error::unknown_relabel_source(format!(
                    "No delta for {source}, which is needed for {flow}."
                ))
            })?;
            flows.insert(*flow, value);
        }
        Ok(RawFlows(flows))
    }
}
