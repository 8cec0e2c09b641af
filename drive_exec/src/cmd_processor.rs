//! # Command processor module
//!
//! The command processor routes drive commands coming from the command
//! source onto the drive control entry points. A command that cannot be
//! serviced (e.g. an unloadable trajectory file) is logged and dropped; it
//! never takes the cycle down.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use std::sync::Arc;

// Internal
use drive_lib::data_store::DataStore;
use drive_lib::drive_ctrl::DriveCmd;
use drive_lib::traj_ctrl::Trajectory;
use util::session::Session;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a drive command.
///
/// Mutates the datastore to send commands to the drive control module.
pub(crate) fn exec(ds: &mut DataStore, session: &Session, cmd: &DriveCmd) {
    match cmd {
        DriveCmd::FollowTrajectory { file } => {
            debug!("Recieved FollowTrajectory command ({})", file);

            match Trajectory::load(file) {
                Ok(t) => {
                    let trajectory = Arc::new(t);

                    // Archive a copy of what is actually being followed
                    session.save("trajectories/followed.json", (*trajectory).clone());

                    ds.drive_ctrl.follow_trajectory(trajectory, ds.time_s);
                }
                Err(e) => warn!("Could not load trajectory \"{}\": {}", file, e),
            }
        }
        DriveCmd::VelocityServo { left_ms, right_ms } => {
            debug!(
                "Recieved VelocityServo command (left {} m/s, right {} m/s)",
                left_ms, right_ms
            );
            ds.drive_ctrl.set_velocity_servo(*left_ms, *right_ms);
        }
        DriveCmd::RawDrive { left, right } => {
            ds.drive_ctrl.drive_raw(*left, *right);
        }
        DriveCmd::Curvature {
            throttle,
            turn,
            quick_turn,
        } => {
            ds.drive_ctrl.drive_curvature(*throttle, *turn, *quick_turn);
        }
        DriveCmd::Disable => {
            debug!("Recieved Disable command");
            ds.drive_ctrl.disable();
        }
    }
}
