//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Wrap an angle into the range (-pi, pi].
pub fn normalise_angle<T>(angle: T) -> T
where
    T: Float + FloatConst
{
    let pi_t = T::PI();
    let tau_t = pi_t + pi_t;

    let wrapped = rem_euclid(angle + pi_t, tau_t);

    // rem_euclid gives [0, 2pi), shift so that -pi maps onto +pi
    if wrapped <= T::zero() {
        wrapped + pi_t
    }
    else {
        wrapped - pi_t
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Index `offset` places after `index` in a cyclic sequence of length `len`.
///
/// `len` must be non-zero.
pub fn cyclic_index(index: usize, offset: isize, len: usize) -> usize {
    (index as isize + offset).rem_euclid(len as isize) as usize
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_normalise_angle() {
        assert_eq!(normalise_angle(0f64), 0f64);
        assert!((normalise_angle(1f64) - 1.0).abs() < 1e-12);
        assert!((normalise_angle(-1f64) + 1.0).abs() < 1e-12);
        assert_eq!(normalise_angle(PI), PI);
        assert_eq!(normalise_angle(-PI), PI);
        assert!((normalise_angle(TAU + 0.5) - 0.5).abs() < 1e-12);
        assert!((normalise_angle(-TAU - 0.5) + 0.5).abs() < 1e-12);
        assert!((normalise_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rem_euclid() {
        assert_eq!(rem_euclid(7f64, 4f64), 3f64);
        assert_eq!(rem_euclid(-1f64, 4f64), 3f64);
    }

    #[test]
    fn test_cyclic_index() {
        assert_eq!(cyclic_index(0, -1, 5), 4);
        assert_eq!(cyclic_index(4, 1, 5), 0);
        assert_eq!(cyclic_index(2, 13, 5), 0);
        assert_eq!(cyclic_index(3, 0, 5), 3);
    }
}
