//! # Differential drive kinematics
//!
//! Stateless transforms between driver inputs, chassis velocities and
//! per-side wheel demands. All functions here are pure: they hold no state
//! and are safe to call from any mode.
//!
//! Sign conventions, used consistently across the crate:
//! - positive duty/rate drives a wheel forwards,
//! - positive angular velocity (and positive `turn`) rotates the robot
//!   counter-clockwise, i.e. the right side runs faster than the left.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use util::maths::clamp_abs;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A pair of per-side values (rates, voltages, duties, controllers).
///
/// The two sides are always computed and applied together so that neither
/// can go stale independently of the other.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelPair<T> {
    pub left: T,
    pub right: T,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> WheelPair<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Curvature drive inverse kinematics, mapping driver throttle and turn
/// inputs onto per-side duties in [-1, 1].
///
/// With `quick_turn` false the turn demand scales with the magnitude of the
/// throttle, giving a constant-curvature feel at any speed. With
/// `quick_turn` true rotation dominates and the throttle scaling is
/// bypassed entirely, allowing the robot to pivot in place.
pub fn curvature_drive_ik(throttle: f64, turn: f64, quick_turn: bool) -> WheelPair<f64> {
    let throttle = clamp_abs(throttle, 1.0);
    let turn = clamp_abs(turn, 1.0);

    let (mut left, mut right) = if quick_turn {
        (-turn, turn)
    } else {
        (
            throttle - throttle.abs() * turn,
            throttle + throttle.abs() * turn,
        )
    };

    // Desaturate, preserving the ratio between the sides. The divisor is
    // at least one so a zero demand can never divide by zero.
    let max_mag = left.abs().max(right.abs());
    if max_mag > 1.0 {
        left /= max_mag;
        right /= max_mag;
    }

    WheelPair::new(left, right)
}

/// Tank drive: direct pass-through of duty demands, clamped to [-1, 1].
pub fn tank_drive(left: f64, right: f64) -> WheelPair<f64> {
    WheelPair::new(clamp_abs(left, 1.0), clamp_abs(right, 1.0))
}

/// Convert chassis (linear, angular) velocity into per-side wheel speeds.
///
/// Units: meters/second and radians/second in, meters/second out.
pub fn wheel_speeds(linear_ms: f64, angular_rads: f64, track_width_m: f64) -> WheelPair<f64> {
    WheelPair::new(
        linear_ms - angular_rads * track_width_m / 2.0,
        linear_ms + angular_rads * track_width_m / 2.0,
    )
}

/// Convert per-side wheel speeds into chassis (linear, angular) velocity.
///
/// Inverse of [`wheel_speeds`].
pub fn chassis_speeds(wheels: &WheelPair<f64>, track_width_m: f64) -> (f64, f64) {
    (
        (wheels.left + wheels.right) / 2.0,
        (wheels.right - wheels.left) / track_width_m,
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        let track = 0.66;
        for &(v, w) in &[(0.0, 0.0), (1.5, 0.0), (0.0, 2.0), (-0.8, 1.3), (2.0, -3.1)] {
            let wheels = wheel_speeds(v, w, track);
            let (v2, w2) = chassis_speeds(&wheels, track);
            assert!((v - v2).abs() < 1e-12, "linear {} != {}", v, v2);
            assert!((w - w2).abs() < 1e-12, "angular {} != {}", w, w2);
        }
    }

    #[test]
    fn test_positive_angular_drives_right_faster() {
        let wheels = wheel_speeds(1.0, 1.0, 0.5);
        assert!(wheels.right > wheels.left);
    }

    #[test]
    fn test_quick_turn_is_pure_rotation() {
        // Quick turn must pivot in place regardless of throttle
        let wheels = curvature_drive_ik(0.5, 1.0, true);
        assert_eq!(wheels.left, -wheels.right);
        assert!((wheels.left.abs() - 1.0).abs() < 1e-12);

        let no_throttle = curvature_drive_ik(0.0, 1.0, true);
        assert_eq!(wheels, no_throttle);
    }

    #[test]
    fn test_zero_throttle_no_quick_turn_stops() {
        // Without quick turn the turn authority scales with throttle, so a
        // stationary robot stays stationary
        let wheels = curvature_drive_ik(0.0, 1.0, false);
        assert_eq!(wheels, WheelPair::new(0.0, 0.0));
    }

    #[test]
    fn test_curvature_outputs_bounded() {
        for &(t, c, q) in &[
            (1.0, 1.0, false),
            (-1.0, 1.0, false),
            (1.0, -1.0, true),
            (5.0, -7.0, false),
        ] {
            let wheels = curvature_drive_ik(t, c, q);
            assert!(wheels.left.abs() <= 1.0);
            assert!(wheels.right.abs() <= 1.0);
        }
    }

    #[test]
    fn test_tank_drive_clamps() {
        let wheels = tank_drive(2.0, -3.0);
        assert_eq!(wheels, WheelPair::new(1.0, -1.0));
    }
}
