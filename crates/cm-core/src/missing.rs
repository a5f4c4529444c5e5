//! Missing-value sentinel.
//!
//! A masked output period, or a gap in the input, is represented by a
//! distinguished sentinel value rather than by an error. For floating-point
//! data the sentinel is `NaN`, so it can never collide with a computable
//! value such as `0.0`.

use num_traits::Float;

/// A numeric type with a distinguished "missing" sentinel.
pub trait Missing: Sized + Copy {
    /// The sentinel value.
    fn missing() -> Self;

    /// Return `true` if `self` is the sentinel.
    fn is_missing(&self) -> bool;

    /// Return `true` if `self` is a usable sample.
    fn is_valid(&self) -> bool {
        !self.is_missing()
    }
}

impl Missing for f64 {
    fn missing() -> Self {
        f64::NAN
    }

    fn is_missing(&self) -> bool {
        self.is_nan()
    }
}

impl Missing for f32 {
    fn missing() -> Self {
        f32::NAN
    }

    fn is_missing(&self) -> bool {
        self.is_nan()
    }
}

/// Number of valid (non-missing) samples in `values`.
pub fn count_valid<T: Float>(values: &[T]) -> usize {
    values.iter().filter(|v| !v.is_nan()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_distinct_from_zero() {
        let m = f64::missing();
        assert!(m.is_missing());
        assert!(!0.0_f64.is_missing());
        assert!(0.0_f64.is_valid());
    }

    #[test]
    fn counts_skip_nan() {
        assert_eq!(count_valid(&[1.0, f64::NAN, 3.0, f64::NAN]), 2);
        assert_eq!(count_valid::<f32>(&[]), 0);
    }
}
