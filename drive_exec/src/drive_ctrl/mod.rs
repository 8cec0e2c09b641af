//! # Drive control module
//!
//! Drive control owns the exclusive drive mode of the robot and converts
//! the active mode's demands into a per-side voltage pair once per cycle.
//! Exactly one mode is active at any instant:
//!
//! - `Disabled`: outputs are forced to zero unconditionally.
//! - `OpenLoop`: the last raw or curvature demand stands until the next
//!   command.
//! - `ClosedLoop`: the trajectory tracker produces corrected wheel-rate
//!   setpoints which the wheel servos turn into voltages.
//! - `VelocityServo`: the wheel servos run directly on externally commanded
//!   rate setpoints.
//!
//! The mode is private and only changes through the named command entry
//! points, each of which applies a pure transition function.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use cmd::*;
pub use params::Params;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The exclusive drive modes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Mode {
    Disabled,
    OpenLoop,
    ClosedLoop,
    VelocityServo,
}

/// Errors which can occur during drive control processing.
///
/// Control-path faults degrade to a safe stop inside the cycle instead of
/// erroring, so no variants exist today; the type keeps the module contract
/// uniform with the rest of the executable.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Mode {
    fn default() -> Self {
        Mode::Disabled
    }
}
