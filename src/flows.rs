// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Decomposition of one cycle's deltas into directional energy flows.

mod relabel;
mod role_deltas;
mod totals;

pub use relabel::{RawFlow, RawFlows, RelabelTable};
pub use role_deltas::RoleDeltas;
pub use totals::{FlowName, FlowTotals};

use crate::paths::pvinverter;
use crate::{Config, DeviceClass, DeviceRole, Error};

/// Turns the role-grouped deltas of a cycle into [`FlowTotals`].
///
/// The decomposer holds no state between cycles; [`decompose`] is a pure
/// function of its input.
///
/// [`decompose`]: FlowDecomposer::decompose
#[derive(Clone, Debug)]
pub struct FlowDecomposer {
    relabel: RelabelTable,
}

impl FlowDecomposer {
    /// Creates a decomposer for the given configuration.
    ///
    /// Returns an error if the configuration doesn't track every counter the
    /// decomposition needs.
    pub fn try_new(config: &Config) -> Result<Self, Error> {
        config.validate()?;

        let relabel = RelabelTable::new(config.ac_inputs);
        relabel.validate(&config.tracked_paths)?;

        if !config
            .tracked_paths
            .contains(DeviceClass::PvInverter, pvinverter::FORWARD)
        {
            return Err(Error::invalid_config(format!(
                "Path {} must be tracked for {}.",
                pvinverter::FORWARD,
                DeviceClass::PvInverter
            )));
        }

        Ok(Self { relabel })
    }

    pub fn relabel_table(&self) -> &RelabelTable {
        &self.relabel
    }

    /// Computes the flow totals of one cycle.
    ///
    /// Returns an `UnknownRelabelSource` error if a counter the decomposition
    /// needs is missing from `deltas`.
    pub fn decompose(&self, deltas: &RoleDeltas) -> Result<FlowTotals, Error> {
        let primary = deltas.role(DeviceRole::PrimaryVeBus).ok_or_else(|| {
            Error::unknown_relabel_source(format!("No deltas for role {}.", DeviceRole::PrimaryVeBus))
        })?;
        let raw = self.relabel.apply(primary)?;

        let pv_output = deltas
            .get(DeviceRole::PvOutputSide, pvinverter::FORWARD)
            .ok_or_else(|| {
                Error::unknown_relabel_source(format!(
                    "No delta for {} of role {}.",
                    pvinverter::FORWARD,
                    DeviceRole::PvOutputSide
                ))
            })?;

        // PV on the grid and genset side of the inverter/charger, and PV on
        // the DC side, aren't decomposed yet and contribute nothing.
        let pv = PvFlows::on_output(
            pv_output,
            raw.get(RawFlow::ConsumersToGrid),
            raw.get(RawFlow::ConsumersToDc),
        );

        Ok(FlowTotals {
            grid_to_consumers: raw.get(RawFlow::GridToConsumers),
            grid_to_battery: raw.get(RawFlow::GridToDc),
            genset_to_consumers: raw.get(RawFlow::GensetToConsumers),
            genset_to_battery: raw.get(RawFlow::GensetToDc),
            pv_to_battery: pv.to_battery,
            pv_to_consumers: pv.to_consumers,
            pv_to_grid: pv.to_grid,
            battery_to_consumers: raw.get(RawFlow::DcToConsumers),
            battery_to_grid: raw.get(RawFlow::DcToGrid),
        })
    }
}

/// Split of the energy produced by PV inverters on the AC output.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PvFlows {
    to_battery: f64,
    to_grid: f64,
    to_consumers: f64,
}

impl PvFlows {
    /// The PV meter and the inverter/charger meter count independently, so
    /// every share is clipped to what is left of `pv_output`.
    fn on_output(pv_output: f64, consumers_to_grid: f64, consumers_to_dc: f64) -> Self {
        let to_battery = consumers_to_dc.min(pv_output);
        let to_grid = consumers_to_grid.min(pv_output - to_battery);
        let to_consumers = (pv_output - consumers_to_grid - consumers_to_dc).max(0.0);
        Self {
            to_battery,
            to_grid,
            to_consumers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AcInputs, ChannelRole, TrackedPaths};
    use crate::paths::vebus;
    use crate::MetricPath;
    use pretty_assertions::assert_eq;

    fn primary_deltas(values: &[(&str, f64)]) -> RoleDeltas {
        let mut deltas = RoleDeltas::new();
        for path in vebus::ALL {
            deltas.insert(DeviceRole::PrimaryVeBus, path, 0.0);
        }
        for (path, value) in values {
            deltas.insert(DeviceRole::PrimaryVeBus, *path, *value);
        }
        deltas.insert(DeviceRole::PvOutputSide, pvinverter::FORWARD, 0.0);
        deltas
    }

    #[test]
    fn test_end_to_end_example() -> Result<(), Error> {
        let config = Config {
            ac_inputs: AcInputs {
                ac_in_1: ChannelRole::Genset,
                ac_in_2: ChannelRole::Grid,
            },
            ..Default::default()
        };
        let decomposer = FlowDecomposer::try_new(&config)?;

        let mut deltas = primary_deltas(&[
            (vebus::AC_OUT_TO_AC_IN2, 10.0),
            (vebus::OUT_TO_INVERTER, 5.0),
            (vebus::AC_IN2_TO_AC_OUT, 7.0),
            (vebus::AC_IN1_TO_AC_OUT, 3.0),
        ]);
        deltas.insert(DeviceRole::PvOutputSide, pvinverter::FORWARD, 20.0);

        let totals = decomposer.decompose(&deltas)?;
        assert_eq!(
            totals,
            FlowTotals {
                grid_to_consumers: 7.0,
                genset_to_consumers: 3.0,
                pv_to_battery: 5.0,
                pv_to_grid: 10.0,
                pv_to_consumers: 5.0,
                ..Default::default()
            }
        );

        // Same input, same output.
        assert_eq!(decomposer.decompose(&deltas)?, totals);

        Ok(())
    }

    #[test]
    fn test_pass_through_flows() -> Result<(), Error> {
        let decomposer = FlowDecomposer::try_new(&Config::default())?;
        let deltas = primary_deltas(&[
            (vebus::AC_IN1_TO_INVERTER, 1.0),
            (vebus::AC_IN2_TO_INVERTER, 2.0),
            (vebus::AC_IN1_TO_AC_OUT, 3.0),
            (vebus::AC_IN2_TO_AC_OUT, 4.0),
            (vebus::INVERTER_TO_AC_IN1, 5.0),
            (vebus::INVERTER_TO_AC_IN2, 6.0),
            (vebus::INVERTER_TO_AC_OUT, 7.0),
        ]);

        assert_eq!(
            decomposer.decompose(&deltas)?,
            FlowTotals {
                genset_to_battery: 1.0,
                grid_to_battery: 2.0,
                genset_to_consumers: 3.0,
                grid_to_consumers: 4.0,
                battery_to_grid: 6.0,
                battery_to_consumers: 7.0,
                ..Default::default()
            }
        );

        Ok(())
    }

    #[test]
    fn test_pv_clipping() {
        let check = |pv, to_grid, to_dc, expected: (f64, f64, f64)| {
            let flows = PvFlows::on_output(pv, to_grid, to_dc);
            assert_eq!(
                (flows.to_battery, flows.to_grid, flows.to_consumers),
                expected,
                "pv={pv}, to_grid={to_grid}, to_dc={to_dc}"
            );
            assert!(flows.to_battery >= 0.0 && flows.to_grid >= 0.0 && flows.to_consumers >= 0.0);
            assert!(flows.to_battery + flows.to_grid + flows.to_consumers <= pv + 1e-9);
        };

        check(20.0, 10.0, 5.0, (5.0, 10.0, 5.0));
        check(0.0, 10.0, 5.0, (0.0, 0.0, 0.0));
        check(20.0, 0.0, 0.0, (0.0, 0.0, 20.0));
        check(4.0, 10.0, 5.0, (4.0, 0.0, 0.0));
        check(12.0, 10.0, 5.0, (5.0, 7.0, 0.0));
        check(10.0, 10.0, 10.0, (10.0, 0.0, 0.0));
        check(15.0, 10.0, 5.0, (5.0, 10.0, 0.0));
    }

    #[test]
    fn test_pv_flows_never_exceed_output() {
        let values = [0.0, 0.1, 1.0, 2.5, 7.0, 10.0, 33.3, 100.0];
        for pv in values {
            for to_grid in values {
                for to_dc in values {
                    let flows = PvFlows::on_output(pv, to_grid, to_dc);
                    let sum = flows.to_battery + flows.to_grid + flows.to_consumers;
                    assert!(sum <= pv + 1e-9, "pv={pv}, to_grid={to_grid}, to_dc={to_dc}");
                }
            }
        }
    }

    #[test]
    fn test_empty_roles_contribute_zero() -> Result<(), Error> {
        let config = Config::default();
        let decomposer = FlowDecomposer::try_new(&config)?;
        let deltas = RoleDeltas::group(
            &crate::Deltas::default(),
            &crate::RoleRegistry::new(),
            &config.tracked_paths,
        );
        assert_eq!(decomposer.decompose(&deltas)?, FlowTotals::default());
        Ok(())
    }

    #[test]
    fn test_unknown_relabel_source() -> Result<(), Error> {
        let decomposer = FlowDecomposer::try_new(&Config::default())?;

        assert_eq!(
            decomposer.decompose(&RoleDeltas::new()),
            Err(Error::unknown_relabel_source("No deltas for role PrimaryVeBus."))
        );

        let mut deltas = primary_deltas(&[]);
        deltas.insert(DeviceRole::PrimaryVeBus, "/Energy/Other", 1.0);
        let mut incomplete = RoleDeltas::new();
        for path in &vebus::ALL[1..] {
            incomplete.insert(DeviceRole::PrimaryVeBus, *path, 0.0);
        }
        assert_eq!(
            decomposer.decompose(&incomplete),
            Err(Error::unknown_relabel_source(
                "No delta for /Energy/AcIn1ToInverter, which is needed for GensetToDc."
            ))
        );

        let mut no_pv = RoleDeltas::new();
        for path in vebus::ALL {
            no_pv.insert(DeviceRole::PrimaryVeBus, path, 0.0);
        }
        assert_eq!(
            decomposer.decompose(&no_pv),
            Err(Error::unknown_relabel_source(
                "No delta for /Ac/Energy/Forward of role PvOutputSide."
            ))
        );
        assert!(decomposer.decompose(&deltas).is_ok());

        Ok(())
    }

    #[test]
    fn test_try_new_fails_fast() {
        let config = Config {
            tracked_paths: TrackedPaths::new([
                (
                    DeviceClass::VeBus,
                    vebus::ALL.iter().map(|p| MetricPath::from(*p)).collect(),
                ),
                (DeviceClass::SolarCharger, vec!["/Yield/System".into()]),
            ]),
            ..Default::default()
        };
        assert_eq!(
            FlowDecomposer::try_new(&config).unwrap_err(),
            Error::invalid_config("Path /Ac/Energy/Forward must be tracked for PvInverter.")
        );

        let config = Config {
            ac_inputs: AcInputs {
                ac_in_1: ChannelRole::Genset,
                ac_in_2: ChannelRole::Genset,
            },
            ..Default::default()
        };
        assert!(FlowDecomposer::try_new(&config)
            .is_err_and(|e| e.kind() == crate::ErrorKind::InvalidConfig));
    }
}
