//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Serialize;

// Internal
use super::{Params, ParamsError, Trajectory};
use crate::kinematics::{self, WheelPair};
use crate::loc::Pose;
use crate::vel_ctrl::{VelCtrlOutput, WheelVelCtrl};
use util::{
    maths::{sinc, wrap_pi},
    params,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The trajectory tracker.
///
/// Holds the tracking-law parameters; the trajectory itself, the pose and
/// the elapsed follow time all arrive fresh each cycle so the tracker keeps
/// no per-follow state of its own.
#[derive(Default)]
pub struct TrajCtrl {
    params: Params,

    report: StatusReport,
}

/// The status report containing monitoring quantities for each tracking
/// cycle.
#[derive(Default, Copy, Clone, Serialize, Debug)]
pub struct StatusReport {
    /// Error to the target along the robot's forward axis
    pub long_error_m: f64,

    /// Error to the target along the robot's lateral axis (positive left)
    pub lat_error_m: f64,

    /// Error between the robot's heading and the target heading
    pub head_error_rad: f64,

    /// Corrected chassis linear velocity demand
    pub linear_dem_ms: f64,

    /// Corrected chassis angular velocity demand
    pub angular_dem_rads: f64,

    /// If true the tracking law produced a non-finite demand which was
    /// replaced by a zero demand
    pub degenerate_demand: bool,

    /// Left wheel servo terms
    pub left: VelCtrlOutput,

    /// Right wheel servo terms
    pub right: VelCtrlOutput,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur when initialising the module.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(ParamsError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajCtrl {
    /// Initialise the TrajCtrl module from its parameter file.
    pub fn init(params_path: &str) -> Result<Self, TrajCtrlError> {
        let params = match params::load(params_path) {
            Ok(p) => p,
            Err(e) => return Err(TrajCtrlError::ParamLoadError(e)),
        };

        Self::from_params(params)
    }

    /// Initialise the TrajCtrl module from already-built parameters.
    pub fn from_params(params: Params) -> Result<Self, TrajCtrlError> {
        if let Err(e) = params.are_valid() {
            return Err(TrajCtrlError::ParamsInvalid(e));
        }

        Ok(Self {
            params,
            report: StatusReport::default(),
        })
    }

    /// Process one tracking cycle.
    ///
    /// Samples the trajectory at the elapsed follow time (clamping past the
    /// final sample), runs the tracking law on the pose error and drives the
    /// wheel velocity servos with the corrected wheel rates.
    pub fn proc(
        &mut self,
        trajectory: &Trajectory,
        elapsed_s: f64,
        pose: &Pose,
        measured_ms: &WheelPair<f64>,
        vel_ctrl: &mut WheelPair<WheelVelCtrl>,
        dt_s: f64,
    ) -> (WheelPair<f64>, StatusReport) {
        self.report = StatusReport::default();

        let target = trajectory.sample(elapsed_s);

        // Pose error rotated into the robot frame
        let delta_m = target.pose.position_m - pose.position_m;
        let (sin_h, cos_h) = pose.heading_rad.sin_cos();

        let long_error_m = cos_h * delta_m[0] + sin_h * delta_m[1];
        let lat_error_m = -sin_h * delta_m[0] + cos_h * delta_m[1];
        let head_error_rad = wrap_pi(target.pose.heading_rad - pose.heading_rad);

        self.report.long_error_m = long_error_m;
        self.report.lat_error_m = lat_error_m;
        self.report.head_error_rad = head_error_rad;

        // Tracking law: gain scheduled on the desired velocities, the
        // heading term passed through sinc so a zero heading error is well
        // defined.
        let b = self.params.ramsete_b;
        let zeta = self.params.ramsete_zeta;
        let v_des = target.velocity_ms;
        let w_des = target.angular_velocity_rads;

        let k = 2.0 * zeta * (w_des * w_des + b * v_des * v_des).sqrt();

        let mut linear_ms = v_des * head_error_rad.cos() + k * long_error_m;
        let mut angular_rads =
            w_des + b * v_des * sinc(head_error_rad) * lat_error_m + k * head_error_rad;

        // A non-finite demand must never reach the servos
        if !linear_ms.is_finite() || !angular_rads.is_finite() {
            warn!(
                "Tracking law produced a non-finite demand (v = {}, w = {}), \
                substituting zero",
                linear_ms, angular_rads
            );
            self.report.degenerate_demand = true;
            linear_ms = 0.0;
            angular_rads = 0.0;
        }

        self.report.linear_dem_ms = linear_ms;
        self.report.angular_dem_rads = angular_rads;

        // Split the chassis demand over the two sides and servo each wheel
        let setpoints =
            kinematics::wheel_speeds(linear_ms, angular_rads, self.params.track_width_m);

        vel_ctrl.left.set_setpoint(setpoints.left);
        vel_ctrl.right.set_setpoint(setpoints.right);

        let left_out = vel_ctrl.left.calculate(measured_ms.left, dt_s);
        let right_out = vel_ctrl.right.calculate(measured_ms.right, dt_s);

        self.report.left = left_out;
        self.report.right = right_out;

        (
            WheelPair::new(left_out.voltage(), right_out.voltage()),
            self.report,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traj_ctrl::TrajectorySample;
    use crate::vel_ctrl;

    fn test_tracker() -> TrajCtrl {
        TrajCtrl::from_params(Params {
            ramsete_b: 2.0,
            ramsete_zeta: 0.7,
            track_width_m: 0.6,
        })
        .unwrap()
    }

    fn test_servos() -> WheelPair<WheelVelCtrl> {
        let params = vel_ctrl::Params {
            k_p: 1.0,
            k_d: 0.0,
            k_s: 0.5,
            k_v: 0.2,
            k_a: 0.0,
        };
        WheelPair::new(WheelVelCtrl::new(&params), WheelVelCtrl::new(&params))
    }

    fn straight_line() -> Trajectory {
        // 2 m/s straight down the X axis for 5 s
        let samples = (0..=50)
            .map(|i| {
                let t = i as f64 * 0.1;
                TrajectorySample {
                    time_s: t,
                    pose: Pose::new(2.0 * t, 0.0, 0.0),
                    velocity_ms: 2.0,
                    angular_velocity_rads: 0.0,
                    curvature_per_m: 0.0,
                }
            })
            .collect();
        Trajectory::new(samples).unwrap()
    }

    #[test]
    fn test_elapsed_past_end_clamps_to_final_sample() {
        let traj = straight_line();
        let mut tracker = test_tracker();
        let pose = Pose::new(9.5, 0.1, 0.05);
        let measured = WheelPair::new(1.8, 1.9);

        let mut servos_a = test_servos();
        let mut servos_b = test_servos();

        let (v_end, _) = tracker.proc(&traj, 5.0, &pose, &measured, &mut servos_a, 0.02);
        let (v_past, _) = tracker.proc(&traj, 7.0, &pose, &measured, &mut servos_b, 0.02);

        assert_eq!(v_end, v_past);
    }

    #[test]
    fn test_on_path_demand_is_pure_feedforward() {
        // Exactly on the trajectory with matching wheel rates: the law's
        // correction terms vanish and each servo outputs its model voltage
        let traj = straight_line();
        let mut tracker = test_tracker();
        let mut servos = test_servos();

        let pose = Pose::new(2.0, 0.0, 0.0); // sample at t = 1.0
        let measured = WheelPair::new(2.0, 2.0);

        let (v, report) = tracker.proc(&traj, 1.0, &pose, &measured, &mut servos, 0.02);

        assert!((report.long_error_m).abs() < 1e-9);
        assert!((report.lat_error_m).abs() < 1e-9);
        assert!((report.head_error_rad).abs() < 1e-9);
        assert!((report.linear_dem_ms - 2.0).abs() < 1e-9);

        // ks + kv * 2.0 = 0.9 V per wheel
        assert!((v.left - 0.9).abs() < 1e-9);
        assert!((v.right - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_lateral_error_turns_towards_path() {
        // Robot to the right of the path (negative lateral in robot frame
        // means the target is to the right; here the target is to the left)
        let traj = straight_line();
        let mut tracker = test_tracker();
        let mut servos = test_servos();

        // Path is along y = 0, robot displaced to y = -0.2 (target to its
        // left), so the corrected demand must turn counter-clockwise
        let pose = Pose::new(2.0, -0.2, 0.0);
        let measured = WheelPair::new(2.0, 2.0);

        let (_, report) = tracker.proc(&traj, 1.0, &pose, &measured, &mut servos, 0.02);
        assert!(report.angular_dem_rads > 0.0);
    }

    #[test]
    fn test_half_turn_heading_error_is_finite() {
        let traj = straight_line();
        let mut tracker = test_tracker();
        let mut servos = test_servos();

        // Facing exactly backwards along the path
        let pose = Pose::new(2.0, 0.0, std::f64::consts::PI);
        let measured = WheelPair::new(0.0, 0.0);

        let (v, report) = tracker.proc(&traj, 1.0, &pose, &measured, &mut servos, 0.02);
        assert!(v.left.is_finite() && v.right.is_finite());
        assert!(!report.degenerate_demand);
    }
}
