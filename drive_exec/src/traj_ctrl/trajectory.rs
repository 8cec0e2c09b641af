//! Trajectory types
//!
//! A trajectory is an ordered, time-indexed sequence of samples produced by
//! the (external) path generation collaborator. It is immutable once
//! constructed and consumed read-only by the tracker.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use thiserror::Error;

// Internal
use crate::loc::Pose;
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One time-indexed point along a trajectory.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Time of this sample from the start of the trajectory.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Desired pose at this sample.
    pub pose: Pose,

    /// Desired chassis linear velocity.
    ///
    /// Units: meters/second
    pub velocity_ms: f64,

    /// Desired chassis angular velocity.
    ///
    /// Units: radians/second
    pub angular_velocity_rads: f64,

    /// Path curvature at this sample.
    ///
    /// Units: 1/meters
    pub curvature_per_m: f64,
}

/// An ordered, time-indexed sequence of samples.
///
/// Invariants enforced at construction: at least one sample, and sample
/// times never decrease.
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur when building or loading a trajectory.
#[derive(Debug, Error)]
pub enum TrajectoryError {
    #[error("The software root environment variable (DIFFDRIVE_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the trajectory file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the trajectory file: {0}")]
    DeserialiseError(serde_json::Error),

    #[error("A trajectory must contain at least one sample")]
    Empty,

    #[error("Sample times must not decrease (sample {0} is earlier than its predecessor)")]
    NonMonotonic(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    /// Build a trajectory from a sample sequence, validating the invariants.
    pub fn new(samples: Vec<TrajectorySample>) -> Result<Self, TrajectoryError> {
        if samples.is_empty() {
            return Err(TrajectoryError::Empty);
        }

        for i in 1..samples.len() {
            if samples[i].time_s < samples[i - 1].time_s {
                return Err(TrajectoryError::NonMonotonic(i));
            }
        }

        Ok(Self { samples })
    }

    /// Load a trajectory from a JSON file in the software root's `data`
    /// directory.
    ///
    /// The file contains the sample sequence as a JSON array.
    pub fn load(file_name: &str) -> Result<Self, TrajectoryError> {
        let mut path = util::host::get_sw_root()
            .map_err(|_| TrajectoryError::SwRootNotSet)?;
        path.push("data");
        path.push(file_name);

        let traj_str = match read_to_string(path) {
            Ok(s) => s,
            Err(e) => return Err(TrajectoryError::FileLoadError(e)),
        };

        let samples: Vec<TrajectorySample> = match serde_json::from_str(&traj_str) {
            Ok(s) => s,
            Err(e) => return Err(TrajectoryError::DeserialiseError(e)),
        };

        Self::new(samples)
    }

    /// Get the time of the final sample.
    pub fn duration_s(&self) -> f64 {
        // Safe index: construction guarantees at least one sample
        self.samples[self.samples.len() - 1].time_s
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Sample the trajectory at the given time.
    ///
    /// Times before the first sample or after the last clamp to that sample
    /// rather than extrapolating. Between samples the fields are linearly
    /// interpolated, with the heading interpolated over the shortest
    /// rotation.
    pub fn sample(&self, time_s: f64) -> TrajectorySample {
        let first = self.samples[0];
        let last = self.samples[self.samples.len() - 1];

        if time_s <= first.time_s {
            return first;
        }
        if time_s >= last.time_s {
            return last;
        }

        // Find the first sample after the requested time. The clamps above
        // guarantee one exists.
        let next_idx = self
            .samples
            .iter()
            .position(|s| s.time_s > time_s)
            .unwrap_or(self.samples.len() - 1);

        let prev = self.samples[next_idx - 1];
        let next = self.samples[next_idx];

        let span_s = next.time_s - prev.time_s;
        if span_s <= 0.0 {
            // Coincident sample times, no interval to interpolate over
            return next;
        }

        let frac = (time_s - prev.time_s) / span_s;
        let lerp = |a: f64, b: f64| a + (b - a) * frac;

        TrajectorySample {
            time_s,
            pose: Pose {
                position_m: prev.pose.position_m
                    + (next.pose.position_m - prev.pose.position_m) * frac,
                heading_rad: wrap_pi(
                    prev.pose.heading_rad
                        + wrap_pi(next.pose.heading_rad - prev.pose.heading_rad) * frac,
                ),
            },
            velocity_ms: lerp(prev.velocity_ms, next.velocity_ms),
            angular_velocity_rads: lerp(prev.angular_velocity_rads, next.angular_velocity_rads),
            curvature_per_m: lerp(prev.curvature_per_m, next.curvature_per_m),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_at(time_s: f64, x_m: f64, velocity_ms: f64) -> TrajectorySample {
        TrajectorySample {
            time_s,
            pose: Pose::new(x_m, 0.0, 0.0),
            velocity_ms,
            angular_velocity_rads: 0.0,
            curvature_per_m: 0.0,
        }
    }

    #[test]
    fn test_empty_is_error() {
        assert!(matches!(
            Trajectory::new(vec![]),
            Err(TrajectoryError::Empty)
        ));
    }

    #[test]
    fn test_non_monotonic_is_error() {
        let res = Trajectory::new(vec![sample_at(1.0, 0.0, 0.0), sample_at(0.5, 0.0, 0.0)]);
        assert!(matches!(res, Err(TrajectoryError::NonMonotonic(1))));
    }

    #[test]
    fn test_sample_clamps_both_ends() {
        let traj = Trajectory::new(vec![
            sample_at(0.0, 0.0, 0.0),
            sample_at(5.0, 10.0, 2.0),
        ])
        .unwrap();

        let before = traj.sample(-1.0);
        assert_eq!(before.pose.position_m[0], 0.0);

        let at_end = traj.sample(5.0);
        let beyond = traj.sample(7.0);
        assert_eq!(at_end.pose.position_m[0], beyond.pose.position_m[0]);
        assert_eq!(at_end.velocity_ms, beyond.velocity_ms);
    }

    #[test]
    fn test_sample_interpolates() {
        let traj = Trajectory::new(vec![
            sample_at(0.0, 0.0, 0.0),
            sample_at(2.0, 4.0, 2.0),
        ])
        .unwrap();

        let mid = traj.sample(1.0);
        assert!((mid.pose.position_m[0] - 2.0).abs() < 1e-12);
        assert!((mid.velocity_ms - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_heading_interpolation_takes_shortest_rotation() {
        let mut a = sample_at(0.0, 0.0, 0.0);
        a.pose.heading_rad = 3.0;
        let mut b = sample_at(1.0, 0.0, 0.0);
        b.pose.heading_rad = -3.0;

        let traj = Trajectory::new(vec![a, b]).unwrap();

        // Midway between +3 rad and -3 rad the short way is through pi, not
        // through zero
        let mid = traj.sample(0.5);
        assert!(mid.pose.heading_rad.abs() > 3.0 || mid.pose.heading_rad.abs() < 1e-9);
    }
}
