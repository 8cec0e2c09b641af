//! # Simulation client
//!
//! When no hardware is attached the simulation client closes the loop
//! locally: it integrates the commanded duties through a first-order motor
//! model into wheel rates, distances and encoder counts, and propagates a
//! planar pose through the forward differential kinematics. It stands in
//! for both the odometry collaborator (pose) and the encoder hardware
//! (counts).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// Internal
use crate::kinematics::{self, WheelPair};
use crate::loc::Pose;
use crate::wheel_sensors::CountSource;
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulation client
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct Params {
    /// Simulated battery voltage behind a full duty demand.
    ///
    /// Units: volts
    pub battery_voltage_v: f64,

    /// Static friction voltage of the simulated motor model.
    ///
    /// Units: volts
    pub k_s: f64,

    /// Back-EMF voltage per unit wheel rate.
    ///
    /// Units: volts per (meter/second)
    pub k_v: f64,

    /// Voltage per unit wheel acceleration, must be > 0.
    ///
    /// Units: volts per (meter/second^2)
    pub k_a: f64,

    /// Track width of the simulated chassis.
    ///
    /// Units: meters, must be > 0
    pub track_width_m: f64,

    /// Simulated wheel diameter, used to quantise distance into counts.
    ///
    /// Units: meters
    pub wheel_diameter_m: f64,

    /// Simulated encoder counts per wheel revolution.
    pub counts_per_rev: f64,

    /// Initial pose of the simulated robot.
    pub init_pose_x_m: f64,
    pub init_pose_y_m: f64,
    pub init_pose_heading_rad: f64,
}

/// The simulation state.
pub struct SimClient {
    params: Params,

    pose: Pose,
    wheel_rates_ms: WheelPair<f64>,
    wheel_dist_m: WheelPair<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur when initialising the simulation.
#[derive(Debug, Error)]
pub enum SimClientError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("k_a must be greater than zero, got {0}")]
    InvalidKa(f64),

    #[error("track_width_m must be greater than zero, got {0}")]
    InvalidTrackWidth(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimClient {
    /// Initialise the simulation from its parameter file.
    pub fn init(params_path: &str) -> Result<Self, SimClientError> {
        let params = match params::load(params_path) {
            Ok(p) => p,
            Err(e) => return Err(SimClientError::ParamLoadError(e)),
        };

        Self::from_params(params)
    }

    /// Initialise the simulation from already-built parameters.
    pub fn from_params(params: Params) -> Result<Self, SimClientError> {
        if params.k_a <= 0.0 {
            return Err(SimClientError::InvalidKa(params.k_a));
        }
        if params.track_width_m <= 0.0 {
            return Err(SimClientError::InvalidTrackWidth(params.track_width_m));
        }

        Ok(Self {
            pose: Pose::new(
                params.init_pose_x_m,
                params.init_pose_y_m,
                params.init_pose_heading_rad,
            ),
            wheel_rates_ms: WheelPair::new(0.0, 0.0),
            wheel_dist_m: WheelPair::new(0.0, 0.0),
            params,
        })
    }

    /// The simulated pose, standing in for the odometry collaborator.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn wheel_rates_ms(&self) -> WheelPair<f64> {
        self.wheel_rates_ms
    }

    /// Advance the simulation by one cycle under the given duty commands.
    pub fn step(&mut self, duty: WheelPair<f64>, dt_s: f64) {
        self.wheel_rates_ms = WheelPair::new(
            self.step_wheel(self.wheel_rates_ms.left, duty.left, dt_s),
            self.step_wheel(self.wheel_rates_ms.right, duty.right, dt_s),
        );

        self.wheel_dist_m.left += self.wheel_rates_ms.left * dt_s;
        self.wheel_dist_m.right += self.wheel_rates_ms.right * dt_s;

        // Propagate the pose through the forward kinematics
        let (linear_ms, angular_rads) =
            kinematics::chassis_speeds(&self.wheel_rates_ms, self.params.track_width_m);

        self.pose.position_m[0] += linear_ms * self.pose.heading_rad.cos() * dt_s;
        self.pose.position_m[1] += linear_ms * self.pose.heading_rad.sin() * dt_s;
        self.pose.heading_rad += angular_rads * dt_s;
    }

    /// Integrate one wheel's rate through the motor model.
    fn step_wheel(&self, rate_ms: f64, duty: f64, dt_s: f64) -> f64 {
        let volts = duty * self.params.battery_voltage_v;

        // Static friction holds a stopped wheel below the breakaway voltage
        if rate_ms.abs() < 1e-9 && volts.abs() <= self.params.k_s {
            return 0.0;
        }

        let friction_v = if rate_ms > 0.0 {
            self.params.k_s
        } else if rate_ms < 0.0 {
            -self.params.k_s
        } else {
            self.params.k_s * volts.signum()
        };

        let accel = (volts - friction_v - self.params.k_v * rate_ms) / self.params.k_a;

        rate_ms + accel * dt_s
    }
}

impl CountSource for SimClient {
    fn counts(&mut self) -> Option<WheelPair<i64>> {
        let mpc =
            self.params.wheel_diameter_m * std::f64::consts::PI / self.params.counts_per_rev;

        Some(WheelPair::new(
            (self.wheel_dist_m.left / mpc).round() as i64,
            (self.wheel_dist_m.right / mpc).round() as i64,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_sim() -> SimClient {
        SimClient::from_params(Params {
            battery_voltage_v: 12.0,
            k_s: 0.5,
            k_v: 2.0,
            k_a: 0.5,
            track_width_m: 0.6,
            wheel_diameter_m: 0.1524,
            counts_per_rev: 2048.0,
            init_pose_x_m: 0.0,
            init_pose_y_m: 0.0,
            init_pose_heading_rad: 0.0,
        })
        .unwrap()
    }

    #[test]
    fn test_stationary_below_breakaway() {
        let mut sim = test_sim();
        sim.step(WheelPair::new(0.01, 0.01), 0.02);
        assert_eq!(sim.wheel_rates_ms(), WheelPair::new(0.0, 0.0));
    }

    #[test]
    fn test_equal_duty_drives_straight() {
        let mut sim = test_sim();
        for _ in 0..100 {
            sim.step(WheelPair::new(0.5, 0.5), 0.02);
        }

        let pose = sim.pose();
        assert!(pose.position_m[0] > 0.1);
        assert!(pose.position_m[1].abs() < 1e-9);
        assert!(pose.heading_rad.abs() < 1e-9);
    }

    #[test]
    fn test_differential_duty_turns() {
        let mut sim = test_sim();
        for _ in 0..100 {
            sim.step(WheelPair::new(0.2, 0.6), 0.02);
        }

        // Right faster than left turns the robot counter-clockwise
        assert!(sim.pose().heading_rad > 0.0);
    }

    #[test]
    fn test_counts_track_distance() {
        let mut sim = test_sim();
        for _ in 0..100 {
            sim.step(WheelPair::new(0.5, 0.5), 0.02);
        }

        let counts = sim.counts().unwrap();
        assert!(counts.left > 0);
        assert_eq!(counts.left, counts.right);
    }
}
