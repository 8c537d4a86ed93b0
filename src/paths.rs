// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Bus paths of the energy counters exposed by each device class.

/// Counters of an inverter/charger unit.
pub mod vebus {
    pub const AC_IN1_TO_INVERTER: &str = "/Energy/AcIn1ToInverter";
    pub const AC_IN2_TO_INVERTER: &str = "/Energy/AcIn2ToInverter";
    pub const AC_IN1_TO_AC_OUT: &str = "/Energy/AcIn1ToAcOut";
    pub const AC_IN2_TO_AC_OUT: &str = "/Energy/AcIn2ToAcOut";
    pub const INVERTER_TO_AC_IN1: &str = "/Energy/InverterToAcIn1";
    pub const INVERTER_TO_AC_IN2: &str = "/Energy/InverterToAcIn2";
    pub const AC_OUT_TO_AC_IN1: &str = "/Energy/AcOutToAcIn1";
    pub const AC_OUT_TO_AC_IN2: &str = "/Energy/AcOutToAcIn2";
    pub const INVERTER_TO_AC_OUT: &str = "/Energy/InverterToAcOut";
    pub const OUT_TO_INVERTER: &str = "/Energy/OutToInverter";

    pub const ALL: [&str; 10] = [
        AC_IN1_TO_INVERTER,
        AC_IN2_TO_INVERTER,
        AC_IN1_TO_AC_OUT,
        AC_IN2_TO_AC_OUT,
        INVERTER_TO_AC_IN1,
        INVERTER_TO_AC_IN2,
        AC_OUT_TO_AC_IN1,
        AC_OUT_TO_AC_IN2,
        INVERTER_TO_AC_OUT,
        OUT_TO_INVERTER,
    ];
}

pub mod pvinverter {
    pub const FORWARD: &str = "/Ac/Energy/Forward";
}

pub mod solarcharger {
    pub const YIELD_SYSTEM: &str = "/Yield/System";
}

/// Counters of a battery monitor.
pub mod battery {
    pub const DISCHARGED_ENERGY: &str = "/History/DischargedEnergy";
    pub const CHARGED_ENERGY: &str = "/History/ChargedEnergy";
}
