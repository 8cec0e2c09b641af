//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use crate::drive_ctrl::{self, DriveCtrl};
use crate::kinematics::WheelPair;
use crate::motor_driver::{self, MotorDriver};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
///
/// Owns the cyclic modules and the per-cycle inputs/outputs flowing between
/// them. Everything here is touched only by the single cyclic thread.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session time at the start of this cycle
    ///
    /// Units: seconds
    pub time_s: f64,

    // DriveCtrl
    pub drive_ctrl: DriveCtrl,
    pub drive_ctrl_input: drive_ctrl::InputData,
    pub drive_ctrl_output: WheelPair<f64>,
    pub drive_ctrl_status_rpt: drive_ctrl::StatusReport,

    // MotorDriver
    pub motor_driver: MotorDriver,
    pub motor_driver_output: WheelPair<f64>,
    pub motor_driver_status_rpt: motor_driver::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, sets
    /// the 1Hz cycle flag and stores the cycle's timestamp. The time is
    /// passed in by the executive so no module below this point reads a
    /// clock.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64, time_s: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.drive_ctrl_input = drive_ctrl::InputData::default();
        self.drive_ctrl_output = WheelPair::default();
        self.drive_ctrl_status_rpt = drive_ctrl::StatusReport::default();
        self.motor_driver_output = WheelPair::default();
        self.motor_driver_status_rpt = motor_driver::StatusReport::default();

        self.time_s = time_s;
    }
}
