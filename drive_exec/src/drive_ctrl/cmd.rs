//! Commands passed into drive control

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::Mode;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A command arriving at the drive command surface, as carried by command
/// scripts.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd")]
pub enum DriveCmd {
    /// Follow the trajectory stored in the given file (relative to the
    /// software root's `data` directory).
    FollowTrajectory { file: String },

    /// Servo both wheels onto the given rates.
    ///
    /// Units: meters/second
    VelocityServo { left_ms: f64, right_ms: f64 },

    /// Apply raw per-side duty demands in [-1, 1]. `{left: 0, right: 0}` is
    /// the universal stop primitive.
    RawDrive { left: f64, right: f64 },

    /// Teleop curvature drive with throttle and turn demands in [-1, 1].
    Curvature {
        throttle: f64,
        turn: f64,
        quick_turn: bool,
    },

    /// Disable the drive: zero output until another command arrives.
    Disable,
}

/// The kind of a command, for the mode transition function.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum CmdKind {
    FollowTrajectory,
    VelocityServo,
    RawDrive,
    Curvature,
    Disable,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// The mode transition function: pure, and the only way the mode changes.
///
/// `RawDrive` deliberately leaves the mode alone so it can act as a stop
/// primitive from any mode; `Curvature` is the teleop entry into open loop.
pub(crate) fn transition(current: Mode, cmd: CmdKind) -> Mode {
    match cmd {
        CmdKind::FollowTrajectory => Mode::ClosedLoop,
        CmdKind::VelocityServo => Mode::VelocityServo,
        CmdKind::RawDrive => current,
        CmdKind::Curvature => Mode::OpenLoop,
        CmdKind::Disable => Mode::Disabled,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_transition_table() {
        let all_modes = [
            Mode::Disabled,
            Mode::OpenLoop,
            Mode::ClosedLoop,
            Mode::VelocityServo,
        ];

        for &mode in &all_modes {
            assert_eq!(
                transition(mode, CmdKind::FollowTrajectory),
                Mode::ClosedLoop
            );
            assert_eq!(transition(mode, CmdKind::VelocityServo), Mode::VelocityServo);
            assert_eq!(transition(mode, CmdKind::Curvature), Mode::OpenLoop);
            assert_eq!(transition(mode, CmdKind::Disable), Mode::Disabled);

            // Raw drive never changes the mode
            assert_eq!(transition(mode, CmdKind::RawDrive), mode);
        }
    }
}
