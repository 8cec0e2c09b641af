//! Implementations for the DriveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;

// Internal
use super::{cmd::transition, CmdKind, DriveCtrlError, Mode, Params};
use crate::kinematics::{self, WheelPair};
use crate::loc::Pose;
use crate::telem::{NullTelem, TelemSink, TickRecord};
use crate::traj_ctrl::{self, TrajCtrl, TrajCtrlError, Trajectory};
use crate::vel_ctrl::{VelCtrlOutput, WheelVelCtrl};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control module state.
///
/// Created once at startup and alive for the whole operating session. The
/// mode field is plain last-writer-wins state, safe because every writer
/// runs on the single cyclic thread.
pub struct DriveCtrl {
    params: Params,

    /// The active mode. Only ever changed through the command entry points.
    mode: Mode,

    /// One velocity servo per wheel, shared between the velocity-servo mode
    /// and the trajectory tracker.
    vel_ctrl: WheelPair<WheelVelCtrl>,

    traj_ctrl: TrajCtrl,

    /// The trajectory being followed, if any. Shared with the caller, never
    /// copied.
    trajectory: Option<Arc<Trajectory>>,

    /// Session time at which the current follow started.
    traj_start_s: f64,

    /// Latched open-loop duty demand, standing until the next raw or
    /// curvature command.
    open_loop_duty: WheelPair<f64>,

    telem: Box<dyn TelemSink>,

    report: StatusReport,
}

/// Data required to initialise DriveCtrl.
pub struct InitData {
    /// Path to the drive control parameter file
    pub params_path: &'static str,

    /// Path to the trajectory control parameter file
    pub traj_ctrl_params_path: &'static str,

    /// The telemetry sink to push per-tick records into
    pub telem: Box<dyn TelemSink>,
}

/// Input data for one cycle of drive control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Current pose from the odometry collaborator
    pub pose: Pose,

    /// Measured wheel rates
    ///
    /// Units: meters/second
    pub wheel_rates_ms: WheelPair<f64>,

    /// False if the wheel rate measurement was unavailable this cycle and
    /// `wheel_rates_ms` is the zero fallback
    pub rates_valid: bool,

    /// Session time at the start of this cycle
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Cycle period
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// Status report for drive control processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// The mode at the end of the cycle
    pub mode: Mode,

    /// Raised when a closed-loop cycle found no trajectory attached and the
    /// drive fail-safed to disabled
    pub missing_trajectory: bool,

    /// Raised when the cycle ran on the zero-rate sensor fallback
    pub sensor_fallback: bool,

    /// Left wheel servo terms, present in the closed-loop modes only
    pub left: Option<VelCtrlOutput>,

    /// Right wheel servo terms, present in the closed-loop modes only
    pub right: Option<VelCtrlOutput>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur when initialising DriveCtrl.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Failed to initialise trajectory control: {0}")]
    TrajCtrlInit(TrajCtrlError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DriveCtrl {
    fn default() -> Self {
        Self {
            params: Params::default(),
            mode: Mode::Disabled,
            vel_ctrl: WheelPair::default(),
            traj_ctrl: TrajCtrl::default(),
            trajectory: None,
            traj_start_s: 0.0,
            open_loop_duty: WheelPair::default(),
            telem: Box::new(NullTelem),
            report: StatusReport::default(),
        }
    }
}

impl State for DriveCtrl {
    type InitData = InitData;
    type InitError = InitError;

    type InputData = InputData;
    type OutputData = WheelPair<f64>;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the DriveCtrl module.
    ///
    /// Expected init data is the parameter file paths and the telemetry
    /// sink to inject.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        let params: Params = match params::load(init_data.params_path) {
            Ok(p) => p,
            Err(e) => return Err(InitError::ParamLoadError(e)),
        };

        let traj_ctrl = match TrajCtrl::init(init_data.traj_ctrl_params_path) {
            Ok(t) => t,
            Err(e) => return Err(InitError::TrajCtrlInit(e)),
        };

        self.setup(params, traj_ctrl, init_data.telem);

        Ok(())
    }

    /// Perform cyclic processing of drive control.
    ///
    /// Exactly one mode handler runs, producing the per-side voltage pair.
    /// A cycle always produces a defined output: faults degrade to a zero
    /// demand rather than erroring out of the loop.
    fn proc(&mut self, input: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        if !input.rates_valid {
            warn!("Wheel rate measurement unavailable, servoing against zero");
            self.report.sensor_fallback = true;
        }

        let voltages_v = match self.mode {
            Mode::Disabled => WheelPair::new(0.0, 0.0),
            Mode::OpenLoop => self.mode_open_loop(),
            Mode::ClosedLoop => self.mode_closed_loop(input),
            Mode::VelocityServo => self.mode_velocity_servo(input),
        };

        // Recorded after the handlers so an in-cycle fail-safe transition is
        // visible in the report
        self.report.mode = self.mode;

        self.write_telem(input, &voltages_v);

        Ok((voltages_v, self.report))
    }
}

impl DriveCtrl {
    /// Build the module directly from parameter structs, for callers (and
    /// tests) that don't go through parameter files.
    pub fn from_params(
        params: Params,
        traj_ctrl_params: traj_ctrl::Params,
        telem: Box<dyn TelemSink>,
    ) -> Result<Self, InitError> {
        let traj_ctrl = match TrajCtrl::from_params(traj_ctrl_params) {
            Ok(t) => t,
            Err(e) => return Err(InitError::TrajCtrlInit(e)),
        };

        let mut ctrl = Self::default();
        ctrl.setup(params, traj_ctrl, telem);

        Ok(ctrl)
    }

    fn setup(&mut self, params: Params, traj_ctrl: TrajCtrl, telem: Box<dyn TelemSink>) {
        self.vel_ctrl = WheelPair::new(
            WheelVelCtrl::new(&params.vel_ctrl),
            WheelVelCtrl::new(&params.vel_ctrl),
        );
        self.params = params;
        self.traj_ctrl = traj_ctrl;
        self.telem = telem;
    }

    /// The currently active mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Begin following a trajectory.
    ///
    /// The trajectory is shared, not copied, and the follow clock starts at
    /// `now_s`. Puts the drive into closed-loop mode.
    pub fn follow_trajectory(&mut self, trajectory: Arc<Trajectory>, now_s: f64) {
        debug!(
            "Following a {:.2} s trajectory with {} samples",
            trajectory.duration_s(),
            trajectory.num_samples()
        );

        self.trajectory = Some(trajectory);
        self.traj_start_s = now_s;
        self.mode = transition(self.mode, CmdKind::FollowTrajectory);
    }

    /// Servo both wheels onto the given rates and enter velocity-servo mode.
    ///
    /// Writes both setpoints; the servos' feedback history is deliberately
    /// left alone so the correction stays continuous across the change.
    pub fn set_velocity_servo(&mut self, left_ms: f64, right_ms: f64) {
        self.vel_ctrl.left.set_setpoint(left_ms);
        self.vel_ctrl.right.set_setpoint(right_ms);
        self.mode = transition(self.mode, CmdKind::VelocityServo);
    }

    /// Latch raw per-side duty demands through the tank mapping.
    ///
    /// Does not change the mode: callers either already put the drive into
    /// open loop, or use `(0, 0)` purely as a stop primitive.
    pub fn drive_raw(&mut self, left: f64, right: f64) {
        self.open_loop_duty = kinematics::tank_drive(left, right);
        self.mode = transition(self.mode, CmdKind::RawDrive);
    }

    /// Latch a teleop curvature-drive demand and enter open-loop mode.
    pub fn drive_curvature(&mut self, throttle: f64, turn: f64, quick_turn: bool) {
        self.open_loop_duty = kinematics::curvature_drive_ik(throttle, turn, quick_turn);
        self.mode = transition(self.mode, CmdKind::Curvature);
    }

    /// Disable the drive: zero output until another command arrives.
    pub fn disable(&mut self) {
        self.mode = transition(self.mode, CmdKind::Disable);
    }

    /// Open loop: the latched demand stands, scaled onto the battery bus.
    fn mode_open_loop(&self) -> WheelPair<f64> {
        WheelPair::new(
            self.open_loop_duty.left * self.params.battery_voltage_v,
            self.open_loop_duty.right * self.params.battery_voltage_v,
        )
    }

    /// Closed loop: delegate to the trajectory tracker.
    ///
    /// If no trajectory is attached the drive fails safe: disabled, zero
    /// output, no error raised to the caller.
    fn mode_closed_loop(&mut self, input: &InputData) -> WheelPair<f64> {
        let trajectory = match self.trajectory {
            Some(ref t) => t.clone(),
            None => {
                warn!("In closed-loop mode with no trajectory attached, disabling drive");
                self.report.missing_trajectory = true;
                self.mode = Mode::Disabled;
                return WheelPair::new(0.0, 0.0);
            }
        };

        let elapsed_s = input.time_s - self.traj_start_s;

        let (voltages_v, traj_report) = self.traj_ctrl.proc(
            &trajectory,
            elapsed_s,
            &input.pose,
            &input.wheel_rates_ms,
            &mut self.vel_ctrl,
            input.dt_s,
        );

        self.telem.publish("traj long error (m)", traj_report.long_error_m);
        self.telem.publish("traj lat error (m)", traj_report.lat_error_m);
        self.telem
            .publish("traj head error (rad)", traj_report.head_error_rad);

        self.report.left = Some(traj_report.left);
        self.report.right = Some(traj_report.right);

        voltages_v
    }

    /// Velocity servo: both wheels run on their stored setpoints.
    fn mode_velocity_servo(&mut self, input: &InputData) -> WheelPair<f64> {
        let left_out = self.vel_ctrl.left.calculate(input.wheel_rates_ms.left, input.dt_s);
        let right_out = self
            .vel_ctrl
            .right
            .calculate(input.wheel_rates_ms.right, input.dt_s);

        self.report.left = Some(left_out);
        self.report.right = Some(right_out);

        WheelPair::new(left_out.voltage(), right_out.voltage())
    }

    /// Push this cycle's telemetry: dashboard values plus the per-tick
    /// record.
    fn write_telem(&mut self, input: &InputData, voltages_v: &WheelPair<f64>) {
        self.telem.publish("left rate (m/s)", input.wheel_rates_ms.left);
        self.telem
            .publish("right rate (m/s)", input.wheel_rates_ms.right);
        self.telem.publish("left voltage (V)", voltages_v.left);
        self.telem.publish("right voltage (V)", voltages_v.right);

        let mut record = TickRecord::open_loop(input.time_s, self.mode, &input.wheel_rates_ms);

        if let (Some(left), Some(right)) = (self.report.left, self.report.right) {
            self.telem.publish("left setpoint (m/s)", left.setpoint_ms);
            self.telem.publish("right setpoint (m/s)", right.setpoint_ms);

            record.left_setpoint_ms = Some(left.setpoint_ms);
            record.right_setpoint_ms = Some(right.setpoint_ms);
            record.left_feedback_v = Some(left.feedback_v);
            record.right_feedback_v = Some(right.feedback_v);
            record.left_feedforward_v = Some(left.feedforward_v);
            record.right_feedforward_v = Some(right.feedforward_v);
        }

        self.telem.record(&record);
    }

    #[cfg(test)]
    pub(crate) fn force_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traj_ctrl::TrajectorySample;
    use crate::vel_ctrl;

    use std::sync::Mutex;

    /// A sink capturing every record, shared with the test through the Arc.
    #[derive(Clone, Default)]
    struct RecordingTelem {
        records: Arc<Mutex<Vec<TickRecord>>>,
    }

    impl TelemSink for RecordingTelem {
        fn publish(&mut self, _key: &str, _value: f64) {}

        fn record(&mut self, record: &TickRecord) {
            self.records.lock().unwrap().push(*record);
        }
    }

    fn test_ctrl_with(telem: Box<dyn TelemSink>) -> DriveCtrl {
        DriveCtrl::from_params(
            Params {
                battery_voltage_v: 12.0,
                vel_ctrl: vel_ctrl::Params {
                    k_p: 1.0,
                    k_d: 0.0,
                    k_s: 0.5,
                    k_v: 0.2,
                    k_a: 0.0,
                },
            },
            traj_ctrl::Params {
                ramsete_b: 2.0,
                ramsete_zeta: 0.7,
                track_width_m: 0.6,
            },
            telem,
        )
        .unwrap()
    }

    fn test_ctrl() -> DriveCtrl {
        test_ctrl_with(Box::new(NullTelem))
    }

    fn test_input(rates: WheelPair<f64>, time_s: f64) -> InputData {
        InputData {
            pose: Pose::default(),
            wheel_rates_ms: rates,
            rates_valid: true,
            time_s,
            dt_s: 0.02,
        }
    }

    fn test_trajectory() -> Arc<Trajectory> {
        let samples = (0..=10)
            .map(|i| {
                let t = i as f64 * 0.5;
                TrajectorySample {
                    time_s: t,
                    pose: Pose::new(t, 0.0, 0.0),
                    velocity_ms: 1.0,
                    angular_velocity_rads: 0.0,
                    curvature_per_m: 0.0,
                }
            })
            .collect();
        Arc::new(Trajectory::new(samples).unwrap())
    }

    #[test]
    fn test_disabled_outputs_zero_from_any_prior_mode() {
        // Velocity servo with live setpoints, then disable: the next cycle
        // must output exactly (0, 0)
        let mut ctrl = test_ctrl();
        ctrl.set_velocity_servo(2.0, 2.0);
        ctrl.proc(&test_input(WheelPair::new(0.0, 0.0), 0.0)).unwrap();

        ctrl.disable();
        let (out, report) = ctrl.proc(&test_input(WheelPair::new(0.0, 0.0), 0.02)).unwrap();
        assert_eq!(out, WheelPair::new(0.0, 0.0));
        assert_eq!(report.mode, Mode::Disabled);

        // Same from open loop
        let mut ctrl = test_ctrl();
        ctrl.drive_curvature(1.0, 0.0, false);
        ctrl.disable();
        let (out, _) = ctrl.proc(&test_input(WheelPair::new(0.0, 0.0), 0.0)).unwrap();
        assert_eq!(out, WheelPair::new(0.0, 0.0));
    }

    #[test]
    fn test_closed_loop_without_trajectory_fails_safe() {
        let mut ctrl = test_ctrl();
        ctrl.force_mode(Mode::ClosedLoop);

        let (out, report) = ctrl.proc(&test_input(WheelPair::new(0.0, 0.0), 0.0)).unwrap();

        // Zero output and disabled within the same tick
        assert_eq!(out, WheelPair::new(0.0, 0.0));
        assert!(report.missing_trajectory);
        assert_eq!(report.mode, Mode::Disabled);
        assert_eq!(ctrl.mode(), Mode::Disabled);
    }

    #[test]
    fn test_velocity_servo_scenario() {
        // Both setpoints 2 m/s, measured at rest: 1.0*(2-0) + 0.5 + 0.2*2
        // = 2.9 V per wheel
        let mut ctrl = test_ctrl();
        ctrl.set_velocity_servo(2.0, 2.0);

        let (out, report) = ctrl.proc(&test_input(WheelPair::new(0.0, 0.0), 0.0)).unwrap();
        assert!((out.left - 2.9).abs() < 1e-12);
        assert!((out.right - 2.9).abs() < 1e-12);
        assert_eq!(report.mode, Mode::VelocityServo);
        assert_eq!(report.left.unwrap().setpoint_ms, 2.0);
    }

    #[test]
    fn test_open_loop_demand_latches() {
        let mut ctrl = test_ctrl();
        ctrl.drive_curvature(0.5, 0.0, false);
        assert_eq!(ctrl.mode(), Mode::OpenLoop);

        // The demand stands across cycles until the next command
        for i in 0..3 {
            let (out, _) = ctrl
                .proc(&test_input(WheelPair::new(0.0, 0.0), i as f64 * 0.02))
                .unwrap();
            assert!((out.left - 6.0).abs() < 1e-12);
            assert!((out.right - 6.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_raw_drive_keeps_mode() {
        let mut ctrl = test_ctrl();
        assert_eq!(ctrl.mode(), Mode::Disabled);

        // A raw stop from disabled leaves the drive disabled, and the
        // disabled output wins
        ctrl.drive_raw(0.3, 0.3);
        assert_eq!(ctrl.mode(), Mode::Disabled);
        let (out, _) = ctrl.proc(&test_input(WheelPair::new(0.0, 0.0), 0.0)).unwrap();
        assert_eq!(out, WheelPair::new(0.0, 0.0));
    }

    #[test]
    fn test_follow_trajectory_runs_tracker() {
        let mut ctrl = test_ctrl();
        ctrl.follow_trajectory(test_trajectory(), 10.0);
        assert_eq!(ctrl.mode(), Mode::ClosedLoop);

        let input = test_input(WheelPair::new(1.0, 1.0), 10.5);
        let (out, report) = ctrl.proc(&input).unwrap();

        assert!(out.left.is_finite() && out.right.is_finite());
        assert_eq!(report.mode, Mode::ClosedLoop);
        assert!(report.left.is_some() && report.right.is_some());
    }

    #[test]
    fn test_tick_record_shape_follows_mode() {
        let sink = RecordingTelem::default();
        let records = sink.records.clone();
        let mut ctrl = test_ctrl_with(Box::new(sink));

        // A disabled tick carries the measured rates only
        ctrl.proc(&test_input(WheelPair::new(0.5, 0.5), 0.0)).unwrap();

        // A velocity-servo tick carries the full servo terms
        ctrl.set_velocity_servo(2.0, 2.0);
        ctrl.proc(&test_input(WheelPair::new(0.5, 0.5), 0.02)).unwrap();

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].mode, Mode::Disabled);
        assert_eq!(records[0].left_rate_ms, 0.5);
        assert!(records[0].left_setpoint_ms.is_none());

        assert_eq!(records[1].mode, Mode::VelocityServo);
        assert_eq!(records[1].left_setpoint_ms, Some(2.0));
        assert!(records[1].left_feedback_v.is_some());
        assert!(records[1].left_feedforward_v.is_some());
    }

    #[test]
    fn test_sensor_fallback_is_flagged() {
        let mut ctrl = test_ctrl();
        ctrl.set_velocity_servo(1.0, 1.0);

        let mut input = test_input(WheelPair::new(0.0, 0.0), 0.0);
        input.rates_valid = false;

        let (out, report) = ctrl.proc(&input).unwrap();
        assert!(report.sensor_fallback);
        assert!(out.left.is_finite());
    }
}
