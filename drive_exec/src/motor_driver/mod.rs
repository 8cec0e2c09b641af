//! # Motor driver module
//!
//! The last stage before hardware: converts the per-side voltage demands
//! from drive control into normalised duty commands for the (external)
//! motor controllers, applying the static per-side inversion required by
//! the mechanical mounting, saturating to the available bus and refusing to
//! pass a non-finite value. Whether the duty command actually applies, or
//! is dropped by a bus fault, is the hardware collaborator's concern.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::{Params, ParamsError};
pub use state::*;
