//! # Trajectory control module
//!
//! Trajectory control is responsible for keeping the robot on a
//! time-parameterised trajectory. Each cycle the trajectory is sampled at
//! the elapsed follow time, the pose error to the sampled target is
//! expressed in the robot's own frame, and a nonlinear (Ramsete-style)
//! feedback law converts that error into corrected chassis velocity
//! demands. The demands are split into per-side wheel rates over the track
//! width and handed to the wheel velocity servos, which produce the final
//! voltage pair.
//!
//! Beyond the end of the trajectory the final sample is held; detecting
//! completion and leaving closed-loop mode is the caller's responsibility.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod trajectory;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::{Params, ParamsError};
pub use state::*;
pub use trajectory::*;
