//! Drive control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::vel_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Params {
    /// Nominal battery voltage, used to scale open-loop duty demands into
    /// volts.
    ///
    /// Units: volts
    pub battery_voltage_v: f64,

    /// Gains shared by both wheel velocity servos.
    pub vel_ctrl: vel_ctrl::Params,
}
