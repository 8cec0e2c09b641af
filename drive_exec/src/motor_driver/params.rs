//! Motor driver parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the motor driver
#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct Params {
    /// The voltage corresponding to a full (1.0) duty demand.
    ///
    /// Units: volts, must be > 0
    pub max_voltage_v: f64,

    /// True if the left side's rotation sense is mechanically mirrored.
    pub left_inverted: bool,

    /// True if the right side's rotation sense is mechanically mirrored.
    pub right_inverted: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors in the loaded parameter values.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("max_voltage_v must be greater than zero, got {0}")]
    InvalidMaxVoltage(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the loaded values are physically meaningful.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if self.max_voltage_v <= 0.0 {
            return Err(ParamsError::InvalidMaxVoltage(self.max_voltage_v));
        }

        Ok(())
    }
}
