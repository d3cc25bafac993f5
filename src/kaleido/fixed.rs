//! Fixed-point helpers
//!
//! Every fractional quantity in the per-pixel path is an integer scaled by
//! `2^FIX_SHIFT`. Rounding conventions live here so the lattice and the
//! resampler agree on them:
//! - `round_*` rounds to nearest, ties toward +infinity
//! - `floor_*` follows floor semantics for negative values

/// Number of fractional bits
pub const FIX_SHIFT: u32 = 12;

/// 1.0 in fixed point
pub const FIX_ONE: i32 = 1 << FIX_SHIFT;

/// Mask selecting the fractional bits
pub const FIX_MASK: i32 = FIX_ONE - 1;

const FIX_HALF: i64 = 1 << (FIX_SHIFT - 1);

/// Convert a float to fixed point, rounding to nearest
#[inline]
pub fn from_f64(v: f64) -> i64 {
    (v * f64::from(FIX_ONE)).round() as i64
}

/// Convert fixed point back to float (tests and diagnostics only)
#[inline]
pub fn to_f64(v: i64) -> f64 {
    v as f64 / f64::from(FIX_ONE)
}

/// `v / 2^FIX_SHIFT`, rounded to nearest
#[inline]
pub fn round_shift(v: i64) -> i64 {
    (v + FIX_HALF) >> FIX_SHIFT
}

/// `(a * b) / 2^FIX_SHIFT` with rounding; both operands in fixed point
#[inline]
pub fn mul_round(a: i32, b: i32) -> i32 {
    (a * b + (FIX_ONE >> 1)) >> FIX_SHIFT
}

/// `n / d` rounded to nearest. `d` must be positive.
#[inline]
pub fn div_round(n: i64, d: i64) -> i64 {
    debug_assert!(d > 0, "div_round: divisor must be positive");
    (2 * n + d).div_euclid(2 * d)
}

/// Split into integer part and non-negative fraction: -2.5 -> (-3, 0.5)
#[inline]
pub fn floor_split(v: i64) -> (i64, i32) {
    (v >> FIX_SHIFT, (v & i64::from(FIX_MASK)) as i32)
}

/// Floor modulo 3, always 0, 1 or 2
#[inline]
pub fn mod3(v: i64) -> usize {
    v.rem_euclid(3) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_floor_split_negative() {
        // -2.5
        let v = -(5 * i64::from(FIX_ONE)) / 2;
        assert_eq!(floor_split(v), (-3, FIX_ONE / 2));
    }

    #[test]
    fn test_mod3_negative() {
        assert_eq!(mod3(-1), 2);
        assert_eq!(mod3(-3), 0);
        assert_eq!(mod3(-4), 2);
        assert_eq!(mod3(5), 2);
    }

    #[test]
    fn test_div_round_ties_and_signs() {
        assert_eq!(div_round(5, 2), 3);
        assert_eq!(div_round(-5, 2), -2);
        assert_eq!(div_round(149, 100), 1);
        assert_eq!(div_round(-149, 100), -1);
        assert_eq!(div_round(-151, 100), -2);
    }

    #[test]
    fn test_from_f64_rounds() {
        assert_eq!(from_f64(1.0), i64::from(FIX_ONE));
        assert_eq!(from_f64(0.5 / f64::from(FIX_ONE)), 1);
        assert_eq!(from_f64(-0.4 / f64::from(FIX_ONE)), 0);
    }

    #[test]
    fn test_mul_round_identity() {
        assert_eq!(mul_round(FIX_ONE, FIX_ONE), FIX_ONE);
        assert_eq!(mul_round(FIX_ONE, 1234), 1234);
        assert_eq!(mul_round(0, FIX_ONE), 0);
    }

    proptest! {
        #[test]
        fn floor_split_recombines(v in -1_000_000_000i64..1_000_000_000) {
            let (i, f) = floor_split(v);
            prop_assert!((0..FIX_ONE).contains(&f));
            prop_assert_eq!((i << FIX_SHIFT) + i64::from(f), v);
        }

        #[test]
        fn mod3_matches_floor_division(v in -1_000_000i64..1_000_000) {
            let m = mod3(v) as i64;
            prop_assert!((0..3).contains(&m));
            prop_assert_eq!(v - m, 3 * v.div_euclid(3));
        }

        #[test]
        fn div_round_within_half(n in -10_000_000i64..10_000_000, d in 1i64..10_000) {
            let q = div_round(n, d);
            // |n/d - q| <= 1/2
            prop_assert!((2 * (n - q * d)).abs() <= d);
        }
    }
}
