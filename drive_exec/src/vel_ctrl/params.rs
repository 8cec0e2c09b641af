//! Velocity control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for one wheel's velocity servo. Both wheels share the same
/// gain set.
#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct Params {
    /// Feedback proportional gain
    ///
    /// Units: volts per (meter/second)
    pub k_p: f64,

    /// Feedback derivative gain
    ///
    /// Units: volts per (meter/second^2)
    pub k_d: f64,

    /// Feedforward static voltage, overcoming friction
    ///
    /// Units: volts
    pub k_s: f64,

    /// Feedforward velocity gain
    ///
    /// Units: volts per (meter/second)
    pub k_v: f64,

    /// Feedforward acceleration gain
    ///
    /// Units: volts per (meter/second^2)
    pub k_a: f64,
}
