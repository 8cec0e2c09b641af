//! # Command script interpreter module
//!
//! This module provides an interpreter for timed command scripts. A script
//! is a plain text file in which each line has the form
//! `<exec_time_s>: <json command>;`, for example:
//!
//! ```text
//! 0.5: {"cmd": "Curvature", "throttle": 0.4, "turn": 0.0, "quick_turn": false};
//! ```
//!
//! The interpreter is generic over the command type, which must be
//! deserialisable from the JSON payload.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
struct Timed<C> {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The command to run
    cmd: C,
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use
/// `.get_pending(current_time_s)` to acquire the commands that need
/// executing this cycle.
pub struct ScriptInterpreter<C> {
    _script_path: PathBuf,
    cmds: VecDeque<Timed<C>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidCommand(f64, serde_json::Error),
}

/// Commands which are due for execution this cycle.
pub enum PendingCmds<C> {
    None,
    Some(Vec<C>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C: DeserializeOwned> ScriptInterpreter<C> {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(
                path.to_string_lossy().to_string()));
        }

        // Load the script into a string
        let script = match fs::read_to_string(script_path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e)),
        };

        let mut interp = Self::from_str(&script)?;
        interp._script_path = path;

        Ok(interp)
    }

    /// Create a new interpreter from the script source itself.
    pub fn from_str(script: &str) -> Result<Self, ScriptError> {

        // Empty queue of commands
        let mut cmd_queue: VecDeque<Timed<C>> = VecDeque::new();

        // Go through the script matching `time: payload;` entries.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .unwrap();

        for cap in re.captures_iter(script) {
            // Parse the exec time
            let exec_time_s: f64 = match cap.get(1).unwrap().as_str().parse() {
                Ok(t) => t,
                Err(e) => return Err(
                    ScriptError::InvalidTimestamp(format!("{}", e))),
            };

            // Parse the command from the payload. The scripts contain JSON
            // only.
            let cmd: C = match serde_json::from_str(
                cap.get(3).unwrap().as_str())
            {
                Ok(c) => c,
                Err(e) => return Err(ScriptError::InvalidCommand(
                    exec_time_s, e,
                )),
            };

            // Build command from the match
            cmd_queue.push_back(Timed {
                exec_time_s,
                cmd,
            });
        }

        if cmd_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            _script_path: PathBuf::new(),
            cmds: cmd_queue,
        })
    }

    /// Return the commands due at `current_time_s`, or `None` if no command
    /// needs executing now.
    ///
    /// Time is passed in by the caller so that the interpreter itself never
    /// reads a clock.
    pub fn get_pending(&mut self, current_time_s: f64) -> PendingCmds<C> {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingCmds::EndOfScript
        }

        let mut cmd_vec: Vec<C> = vec![];

        // Peek items from the queue, if the head's exec time is lower than
        // the current time add it to the vector, and keep adding commands
        // until the exec times are larger than the current time.
        while
            !self.cmds.is_empty()
            &&
            self.cmds.front().unwrap().exec_time_s < current_time_s
        {
            cmd_vec.push(self.cmds.pop_front().unwrap().cmd);
        }

        // If the vector is longer than 0 return Some, otherwise None
        if !cmd_vec.is_empty() {
            PendingCmds::Some(cmd_vec)
        }
        else {
            PendingCmds::None
        }
    }

    /// Get the number of commands remaining in the script
    pub fn get_num_cmds(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestCmd {
        value: f64,
    }

    const SCRIPT: &str = r#"
        0.0: {"value": 1.0};
        1.5: {"value": 2.0};
        3.0: {"value": 3.0};
    "#;

    #[test]
    fn test_parse_and_pend() {
        let mut si: ScriptInterpreter<TestCmd> =
            ScriptInterpreter::from_str(SCRIPT).unwrap();

        assert_eq!(si.get_num_cmds(), 3);
        assert_eq!(si.get_duration(), 3.0);

        // Nothing due before the first command's time
        match si.get_pending(-1.0) {
            PendingCmds::None => (),
            _ => panic!("expected no pending commands"),
        }

        // The first two commands are due by t = 2.0
        match si.get_pending(2.0) {
            PendingCmds::Some(v) => {
                assert_eq!(v.len(), 2);
                assert_eq!(v[0], TestCmd { value: 1.0 });
            }
            _ => panic!("expected pending commands"),
        }

        // Last command, then end of script
        match si.get_pending(10.0) {
            PendingCmds::Some(v) => assert_eq!(v.len(), 1),
            _ => panic!("expected pending commands"),
        }
        match si.get_pending(10.0) {
            PendingCmds::EndOfScript => (),
            _ => panic!("expected end of script"),
        }
    }

    #[test]
    fn test_empty_script_is_error() {
        let res: Result<ScriptInterpreter<TestCmd>, _> =
            ScriptInterpreter::from_str("no commands here");
        assert!(matches!(res, Err(ScriptError::ScriptEmpty)));
    }
}
