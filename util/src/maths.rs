//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Wrap an angle into the range [-pi, pi].
///
/// Used to keep heading errors expressed as the shortest signed rotation.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float,
{
    let pi = T::from(std::f64::consts::PI).unwrap();
    let tau = T::from(std::f64::consts::TAU).unwrap();

    let mut a = rem_euclid(angle + pi, tau) - pi;

    // rem_euclid can return exactly tau for tiny negative inputs, fold that
    // case back into range.
    if a < -pi {
        a = a + tau;
    }
    if a > pi {
        a = a - tau;
    }

    a
}

/// The unnormalised sinc function, sin(x)/x.
///
/// Near zero the ratio is replaced by its Taylor expansion (1 - x^2/6) so
/// the result is always finite.
pub fn sinc<T>(x: T) -> T
where
    T: Float,
{
    let eps = T::from(1e-4).unwrap();

    if x.abs() < eps {
        T::one() - x * x / T::from(6.0).unwrap()
    } else {
        x.sin() / x
    }
}

/// Clamp a value to the symmetric range [-limit, limit].
pub fn clamp_abs<T>(value: T, limit: T) -> T
where
    T: Float,
{
    if value > limit {
        limit
    } else if value < -limit {
        -limit
    } else {
        value
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::from(0.0).unwrap() {
        r + rhs.abs()
    } else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(0f64)).abs() < 1e-12);
        assert!((wrap_pi(PI / 2.0) - PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(5.0 * PI).abs() - PI).abs() < 1e-9);
        assert!(wrap_pi(1e6f64).is_finite());
    }

    #[test]
    fn test_sinc() {
        assert_eq!(sinc(0f64), 1f64);
        assert!((sinc(PI) - 0.0).abs() < 1e-12);
        assert!((sinc(1e-6f64) - 1.0).abs() < 1e-9);
        assert!(sinc(1e-6f64).is_finite());
    }

    #[test]
    fn test_clamp_abs() {
        assert_eq!(clamp_abs(0.5f64, 1.0), 0.5);
        assert_eq!(clamp_abs(1.5f64, 1.0), 1.0);
        assert_eq!(clamp_abs(-1.5f64, 1.0), -1.0);
    }

}
