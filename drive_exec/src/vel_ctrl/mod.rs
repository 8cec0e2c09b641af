//! # Velocity control module
//!
//! Each wheel is closed around a velocity servo combining two independent
//! terms: a PD feedback correction on the measured rate, and a model-based
//! feedforward voltage evaluated on the commanded rate. The two terms are
//! summed, never composed, so with zero tracking error the output is exactly
//! the feedforward model voltage.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controllers;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use params::Params;
