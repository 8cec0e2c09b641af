//! # Localisation module
//!
//! This module defines the pose supplied to drive control by the odometry
//! collaborator. Pose estimation itself lives outside this crate; the pose
//! is read-only here and refreshed once per cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and heading in the world frame) of the robot.
///
/// The world frame is right handed with X forward at zero heading. Heading
/// is the angle to the world X axis, positive counter-clockwise, in radians.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Default)]
pub struct Pose {
    /// The position in the world frame.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// The heading in the world frame.
    ///
    /// Units: radians, positive counter-clockwise
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad,
        }
    }
}
