//! # Wheel sensors module
//!
//! This module owns the per-wheel encoders. A backend (`CountSource`)
//! supplies cumulative quadrature counts; `WheelEncoders` scales them into
//! cumulative distance and differentiates them into rate. Both quantities
//! are exposed read-only, and the odometry collaborator consumes them from
//! here.
//!
//! A backend may fail to produce a reading (hardware fault, bus drop). That
//! surfaces as `None` and the caller falls back to zero rates with a
//! telemetry warning; it is never a hard failure.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::kinematics::WheelPair;
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the wheel encoders
#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct Params {
    /// Driven wheel diameter.
    ///
    /// Units: meters
    pub wheel_diameter_m: f64,

    /// Encoder counts per wheel revolution.
    pub counts_per_rev: f64,
}

/// The per-wheel encoder pair.
#[derive(Default)]
pub struct WheelEncoders {
    params: Params,

    prev_counts: Option<WheelPair<i64>>,
}

/// One cycle's encoder reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncoderReading {
    /// Wheel surface rates.
    ///
    /// Units: meters/second
    pub rates_ms: WheelPair<f64>,

    /// Cumulative wheel surface distances since startup.
    ///
    /// Units: meters
    pub distances_m: WheelPair<f64>,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of cumulative encoder counts, implemented by the hardware layer
/// or the simulation client.
pub trait CountSource {
    /// The cumulative counts for each wheel, or `None` if no reading is
    /// available this cycle.
    fn counts(&mut self) -> Option<WheelPair<i64>>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelEncoders {
    /// Initialise the encoders from their parameter file.
    pub fn init(params_path: &str) -> Result<Self, params::LoadError> {
        Ok(Self {
            params: params::load(params_path)?,
            prev_counts: None,
        })
    }

    /// Build the encoders directly from parameters.
    pub fn from_params(params: Params) -> Self {
        Self {
            params,
            prev_counts: None,
        }
    }

    /// Wheel surface distance represented by one encoder count.
    pub fn metres_per_count(&self) -> f64 {
        self.params.wheel_diameter_m * std::f64::consts::PI / self.params.counts_per_rev
    }

    /// Take a reading from the backend.
    ///
    /// Rates are differentiated against the previous cycle's counts; the
    /// first reading after startup reports zero rate. `None` means the
    /// backend had no reading, in which case the previous counts are kept
    /// so the next successful read doesn't see a false step.
    pub fn read<S: CountSource>(&mut self, source: &mut S, dt_s: f64) -> Option<EncoderReading> {
        let counts = source.counts()?;

        let mpc = self.metres_per_count();

        let distances_m = WheelPair::new(
            counts.left as f64 * mpc,
            counts.right as f64 * mpc,
        );

        let rates_ms = match self.prev_counts {
            Some(prev) if dt_s > 0.0 => WheelPair::new(
                (counts.left - prev.left) as f64 * mpc / dt_s,
                (counts.right - prev.right) as f64 * mpc / dt_s,
            ),
            _ => WheelPair::new(0.0, 0.0),
        };

        self.prev_counts = Some(counts);

        Some(EncoderReading {
            rates_ms,
            distances_m,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct FixedCounts(Option<WheelPair<i64>>);

    impl CountSource for FixedCounts {
        fn counts(&mut self) -> Option<WheelPair<i64>> {
            self.0
        }
    }

    fn test_encoders() -> WheelEncoders {
        // 6 inch wheel, 2048 count encoder
        WheelEncoders::from_params(Params {
            wheel_diameter_m: 0.1524,
            counts_per_rev: 2048.0,
        })
    }

    #[test]
    fn test_count_scaling() {
        let mut enc = test_encoders();
        let mut src = FixedCounts(Some(WheelPair::new(2048, 4096)));

        let reading = enc.read(&mut src, 0.02).unwrap();

        // One and two full revolutions of wheel circumference
        let circumference = 0.1524 * std::f64::consts::PI;
        assert!((reading.distances_m.left - circumference).abs() < 1e-9);
        assert!((reading.distances_m.right - 2.0 * circumference).abs() < 1e-9);

        // No previous reading, so rate is zero
        assert_eq!(reading.rates_ms, WheelPair::new(0.0, 0.0));
    }

    #[test]
    fn test_rate_from_count_delta() {
        let mut enc = test_encoders();
        let mpc = enc.metres_per_count();

        let mut src = FixedCounts(Some(WheelPair::new(0, 0)));
        enc.read(&mut src, 0.02).unwrap();

        src.0 = Some(WheelPair::new(100, -100));
        let reading = enc.read(&mut src, 0.02).unwrap();

        assert!((reading.rates_ms.left - 100.0 * mpc / 0.02).abs() < 1e-9);
        assert!((reading.rates_ms.right + 100.0 * mpc / 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_missing_reading_is_none() {
        let mut enc = test_encoders();
        let mut src = FixedCounts(None);
        assert!(enc.read(&mut src, 0.02).is_none());
    }
}
