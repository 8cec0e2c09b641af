//! # Velocity servo controllers
//!
//! This module provides the PD feedback controller and motor feedforward
//! model which together form one wheel's velocity servo.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PD controller servoing a wheel rate onto its setpoint.
///
/// The error history deliberately survives setpoint changes: the derivative
/// term stays continuous across a new demand, at the cost of a transient
/// kick. Callers that want a clean start must call [`PidController::reset`].
///
/// The controller never reads a clock; the cycle delta is passed in by the
/// caller.
#[derive(Debug, Serialize, Clone, Default)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Derivative gain
    k_d: f64,

    /// Commanded rate
    ///
    /// Units: meters/second
    setpoint: f64,

    /// Error at the previous cycle
    prev_error: Option<f64>,
}

/// A simple permanent-magnet motor feedforward model.
///
/// `voltage = k_s*sign(v) + k_v*v + k_a*a`, with `sign(0) = 0` so a zero
/// demand produces exactly zero volts. Stateless: always evaluated on the
/// commanded rate, never the measurement.
#[derive(Debug, Serialize, Clone, Copy, Default)]
pub struct MotorFeedforward {
    k_s: f64,
    k_v: f64,
    k_a: f64,
}

/// One wheel's velocity servo: feedback + feedforward around a shared
/// setpoint.
#[derive(Debug, Serialize, Clone, Default)]
pub struct WheelVelCtrl {
    pid: PidController,
    ff: MotorFeedforward,
}

/// The per-term breakdown of one servo evaluation, kept separate for
/// telemetry.
#[derive(Debug, Serialize, Clone, Copy, Default)]
pub struct VelCtrlOutput {
    /// The setpoint the servo ran against
    ///
    /// Units: meters/second
    pub setpoint_ms: f64,

    /// Feedback term
    ///
    /// Units: volts
    pub feedback_v: f64,

    /// Feedforward term
    ///
    /// Units: volts
    pub feedforward_v: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_d,
            setpoint: 0.0,
            prev_error: None,
        }
    }

    /// Set the commanded rate. Does not touch the error history.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Clear the internal error history.
    pub fn reset(&mut self) {
        self.prev_error = None;
    }

    /// Get the correction for the given measurement.
    ///
    /// On the first call after construction or reset there is no error
    /// history, so the derivative term is zero rather than a spike.
    pub fn correction(&mut self, measured: f64, dt_s: f64) -> f64 {
        let error = self.setpoint - measured;

        let deriv = match self.prev_error {
            Some(e0) if dt_s > 0.0 => (error - e0) / dt_s,
            _ => 0.0,
        };

        self.prev_error = Some(error);

        self.k_p * error + self.k_d * deriv
    }
}

impl MotorFeedforward {
    /// Create a new model with the given constants.
    pub fn new(k_s: f64, k_v: f64, k_a: f64) -> Self {
        Self { k_s, k_v, k_a }
    }

    /// Evaluate the model for a commanded velocity at zero acceleration.
    pub fn evaluate(&self, velocity: f64) -> f64 {
        self.evaluate_accel(velocity, 0.0)
    }

    /// Evaluate the model for a commanded velocity and acceleration.
    pub fn evaluate_accel(&self, velocity: f64, accel: f64) -> f64 {
        // f64::signum(0.0) is 1.0, which would leak the static term into a
        // zero demand, so the sign is taken explicitly.
        let sign = if velocity > 0.0 {
            1.0
        } else if velocity < 0.0 {
            -1.0
        } else {
            0.0
        };

        self.k_s * sign + self.k_v * velocity + self.k_a * accel
    }
}

impl WheelVelCtrl {
    /// Create a new servo from the module parameters.
    pub fn new(params: &super::Params) -> Self {
        Self {
            pid: PidController::new(params.k_p, params.k_d),
            ff: MotorFeedforward::new(params.k_s, params.k_v, params.k_a),
        }
    }

    /// Set the commanded rate for both terms.
    pub fn set_setpoint(&mut self, rate_ms: f64) {
        self.pid.set_setpoint(rate_ms);
    }

    pub fn setpoint(&self) -> f64 {
        self.pid.setpoint()
    }

    /// Clear the feedback error history.
    pub fn reset(&mut self) {
        self.pid.reset();
    }

    /// Evaluate the servo against a measured rate.
    pub fn calculate(&mut self, measured_ms: f64, dt_s: f64) -> VelCtrlOutput {
        VelCtrlOutput {
            setpoint_ms: self.pid.setpoint(),
            feedback_v: self.pid.correction(measured_ms, dt_s),
            feedforward_v: self.ff.evaluate(self.pid.setpoint()),
        }
    }
}

impl VelCtrlOutput {
    /// The commanded voltage: the sum of the two terms.
    pub fn voltage(&self) -> f64 {
        self.feedback_v + self.feedforward_v
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_params() -> crate::vel_ctrl::Params {
        crate::vel_ctrl::Params {
            k_p: 1.0,
            k_d: 0.0,
            k_s: 0.5,
            k_v: 0.2,
            k_a: 0.0,
        }
    }

    #[test]
    fn test_servo_scenario() {
        // kp=1, kd=0, ks=0.5, kv=0.2, ka=0: setpoint 2.0 m/s measured at
        // rest gives 1.0*(2.0-0.0) + (0.5 + 0.2*2.0) = 2.9 V
        let mut servo = WheelVelCtrl::new(&test_params());
        servo.set_setpoint(2.0);

        let out = servo.calculate(0.0, 0.02);
        assert!((out.voltage() - 2.9).abs() < 1e-12);
    }

    #[test]
    fn test_feedforward_isolation() {
        // With the measurement exactly on the setpoint the feedback error is
        // zero and the output is the bare model voltage
        let params = test_params();
        let mut servo = WheelVelCtrl::new(&params);
        servo.set_setpoint(1.5);

        let ff = MotorFeedforward::new(params.k_s, params.k_v, params.k_a);

        // Two identical measurements so the derivative term is zero too
        servo.calculate(1.5, 0.02);
        let out = servo.calculate(1.5, 0.02);
        assert_eq!(out.feedback_v, 0.0);
        assert_eq!(out.voltage(), ff.evaluate(1.5));
    }

    #[test]
    fn test_superposition() {
        // The servo output is exactly pid correction + feedforward, for a
        // controller pair evolved through the same measurement history
        let params = test_params();
        let mut servo = WheelVelCtrl::new(&params);
        let mut pid = PidController::new(params.k_p, params.k_d);
        let ff = MotorFeedforward::new(params.k_s, params.k_v, params.k_a);

        servo.set_setpoint(-0.75);
        pid.set_setpoint(-0.75);

        for &m in &[0.0, -0.2, -0.5, -0.8, -0.75] {
            let out = servo.calculate(m, 0.02);
            let expected = pid.correction(m, 0.02) + ff.evaluate(-0.75);
            assert!((out.voltage() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_history_survives_setpoint_change() {
        let mut pid = PidController::new(0.0, 1.0);
        pid.set_setpoint(1.0);

        // Build up error history
        pid.correction(0.0, 1.0);

        // Change the setpoint: the derivative on the next call must be taken
        // against the history from the old setpoint, not restart at zero
        pid.set_setpoint(2.0);
        let out = pid.correction(0.0, 1.0);
        assert_eq!(out, 1.0); // d(error)/dt = (2.0 - 1.0) / 1.0
    }

    #[test]
    fn test_reset_clears_history() {
        let mut pid = PidController::new(0.0, 1.0);
        pid.set_setpoint(1.0);
        pid.correction(0.0, 1.0);

        pid.reset();

        // First call after reset has no history, derivative is zero
        let out = pid.correction(0.5, 1.0);
        assert_eq!(out, 0.0);
    }

    #[test]
    fn test_feedforward_sign_at_zero() {
        let ff = MotorFeedforward::new(0.5, 0.2, 0.0);
        assert_eq!(ff.evaluate(0.0), 0.0);
        assert_eq!(ff.evaluate(1.0), 0.7);
        assert_eq!(ff.evaluate(-1.0), -0.7);
    }
}
