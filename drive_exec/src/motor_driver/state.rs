//! # Motor driver module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::Serialize;

// Internal
use super::{Params, ParamsError};
use crate::kinematics::WheelPair;
use util::{maths::clamp_abs, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motor driver module state
#[derive(Default)]
pub struct MotorDriver {
    params: Params,

    report: StatusReport,
}

/// Input data to the motor driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// The per-side voltage demands from drive control.
    ///
    /// Units: volts
    pub voltages_v: WheelPair<f64>,

    /// If true the outputs are forced to zero regardless of the demand.
    pub safe: bool,
}

/// Status report for motor driver processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Raised when the left demand exceeded the bus and was saturated
    pub left_saturated: bool,

    /// Raised when the right demand exceeded the bus and was saturated
    pub right_saturated: bool,

    /// Raised when a non-finite demand was replaced by zero
    pub non_finite_demand: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur when initialising the motor driver.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(ParamsError),
}

/// Errors which can occur during motor driver processing.
///
/// Bad demands are clamped or zeroed rather than errored, so no variants
/// exist today.
#[derive(Debug, thiserror::Error)]
pub enum MotorDriverError {}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for MotorDriver {
    type InitData = &'static str;
    type InitError = InitError;

    type InputData = InputData;
    type OutputData = WheelPair<f64>;
    type StatusReport = StatusReport;
    type ProcError = MotorDriverError;

    /// Initialise the motor driver.
    ///
    /// Expected init data is the path to the module parameters file.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        let params: Params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(InitError::ParamLoadError(e)),
        };

        if let Err(e) = params.are_valid() {
            return Err(InitError::ParamsInvalid(e));
        }

        self.params = params;

        Ok(())
    }

    /// Convert the voltage demands into per-side duty commands.
    fn proc(&mut self, input: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        self.report = StatusReport::default();

        if input.safe {
            return Ok((WheelPair::new(0.0, 0.0), self.report));
        }

        let (left, left_saturated) = self.to_duty(input.voltages_v.left);
        let (right, right_saturated) = self.to_duty(input.voltages_v.right);
        self.report.left_saturated = left_saturated;
        self.report.right_saturated = right_saturated;

        let duty = WheelPair::new(
            if self.params.left_inverted { -left } else { left },
            if self.params.right_inverted { -right } else { right },
        );

        trace!("duty out: left {:.3}, right {:.3}", duty.left, duty.right);

        Ok((duty, self.report))
    }
}

impl MotorDriver {
    /// Build the module directly from parameters, for tests and non-file
    /// callers.
    pub fn from_params(params: Params) -> Result<Self, InitError> {
        if let Err(e) = params.are_valid() {
            return Err(InitError::ParamsInvalid(e));
        }

        Ok(Self {
            params,
            report: StatusReport::default(),
        })
    }

    /// Normalise one side's voltage onto the duty range.
    ///
    /// This is the final gate: a non-finite demand is replaced by zero and
    /// flagged, it must never reach a motor controller.
    fn to_duty(&mut self, voltage_v: f64) -> (f64, bool) {
        if !voltage_v.is_finite() {
            warn!("Non-finite voltage demand ({}), commanding zero", voltage_v);
            self.report.non_finite_demand = true;
            return (0.0, false);
        }

        let raw = voltage_v / self.params.max_voltage_v;
        (clamp_abs(raw, 1.0), raw.abs() > 1.0)
    }
}
