//! # Telemetry sink
//!
//! Drive control pushes two kinds of telemetry each cycle: dashboard-style
//! key/value pairs and a persistent per-tick record. Both are best-effort
//! and must never block or fail the control cycle, so the CSV sink hands
//! records to a background writer thread over a channel and swallows (but
//! logs) any failure.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::Serialize;
use std::sync::mpsc::{channel, Sender};
use std::thread;

// Internal
use crate::drive_ctrl::Mode;
use crate::kinematics::WheelPair;
use util::archive::Archiver;
use util::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One tick's worth of drive telemetry.
///
/// Every tick carries the time and both wheels' measured rates; the servo
/// terms are present only in the closed-loop modes, matching the fact that
/// no setpoint exists in the open-loop or disabled states.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickRecord {
    pub time_s: f64,
    pub mode: Mode,
    pub left_rate_ms: f64,
    pub right_rate_ms: f64,
    pub left_setpoint_ms: Option<f64>,
    pub right_setpoint_ms: Option<f64>,
    pub left_feedback_v: Option<f64>,
    pub right_feedback_v: Option<f64>,
    pub left_feedforward_v: Option<f64>,
    pub right_feedforward_v: Option<f64>,
}

/// A CSV-backed telemetry sink writing on a background thread.
pub struct CsvTelem {
    sender: Sender<TickRecord>,
}

/// A sink which drops everything, for use before init and in tests.
#[derive(Default)]
pub struct NullTelem;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// The telemetry surface injected into drive control.
///
/// Implementations must be non-blocking: a slow or failing storage medium
/// is the sink's problem, never the control cycle's.
pub trait TelemSink {
    /// Push a dashboard value.
    fn publish(&mut self, key: &str, value: f64);

    /// Append the per-tick record.
    fn record(&mut self, record: &TickRecord);
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TickRecord {
    /// Build the record for a tick outside the closed-loop modes, where no
    /// setpoints exist.
    pub fn open_loop(time_s: f64, mode: Mode, rates_ms: &WheelPair<f64>) -> Self {
        Self {
            time_s,
            mode,
            left_rate_ms: rates_ms.left,
            right_rate_ms: rates_ms.right,
            left_setpoint_ms: None,
            right_setpoint_ms: None,
            left_feedback_v: None,
            right_feedback_v: None,
            left_feedforward_v: None,
            right_feedforward_v: None,
        }
    }
}

impl CsvTelem {
    /// Create the sink, opening `drive_ctrl/ticks.csv` in the session's
    /// archive directory and starting the writer thread.
    pub fn new(session: &Session) -> Result<Self, Box<dyn std::error::Error>> {
        let mut archiver = Archiver::from_path(session, "drive_ctrl/ticks.csv")?;

        let (sender, receiver) = channel::<TickRecord>();

        // The writer thread owns the archiver and exits when every sender
        // is gone.
        thread::spawn(move || {
            while let Ok(record) = receiver.recv() {
                if let Err(e) = archiver.serialise(record) {
                    warn!("Could not write telemetry record: {}", e);
                }
            }
        });

        Ok(Self { sender })
    }
}

impl TelemSink for CsvTelem {
    fn publish(&mut self, key: &str, value: f64) {
        trace!("telem: {} = {}", key, value);
    }

    fn record(&mut self, record: &TickRecord) {
        if self.sender.send(*record).is_err() {
            warn!("Telemetry writer thread is gone, dropping record");
        }
    }
}

impl TelemSink for NullTelem {
    fn publish(&mut self, _key: &str, _value: f64) {}

    fn record(&mut self, _record: &TickRecord) {}
}
