//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct Params {
    /// Convergence gain of the tracking law. Larger values tighten
    /// convergence onto the trajectory.
    ///
    /// Units: 1/meters^2, must be > 0
    pub ramsete_b: f64,

    /// Damping factor of the tracking law.
    ///
    /// Units: dimensionless, must be in (0, 1)
    pub ramsete_zeta: f64,

    /// Lateral distance between the two drive sides.
    ///
    /// Units: meters, must be > 0
    pub track_width_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors in the loaded parameter values.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("ramsete_b must be greater than zero, got {0}")]
    InvalidB(f64),

    #[error("ramsete_zeta must be in (0, 1), got {0}")]
    InvalidZeta(f64),

    #[error("track_width_m must be greater than zero, got {0}")]
    InvalidTrackWidth(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the loaded values are physically meaningful.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if self.ramsete_b <= 0.0 {
            return Err(ParamsError::InvalidB(self.ramsete_b));
        }
        if self.ramsete_zeta <= 0.0 || self.ramsete_zeta >= 1.0 {
            return Err(ParamsError::InvalidZeta(self.ramsete_zeta));
        }
        if self.track_width_m <= 0.0 {
            return Err(ParamsError::InvalidTrackWidth(self.track_width_m));
        }

        Ok(())
    }
}
