//! Decimal rounding with round-half-to-even ties

/// Round `x` to `digits` decimal places, breaking exact ties towards the
/// even neighbour.
///
/// The decision is taken on the exact binary value of `x`, not on a scaled
/// copy, so `1.303185945` (stored slightly above the tie) rounds up.
pub fn round(x: f64, digits: u32) -> f64 {
    if !x.is_finite() {
        return x;
    }

    format!("{:.*}", digits as usize, x)
        .parse::<f64>()
        .unwrap_or(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_digits() {
        assert_eq!(round(0.123456789, 8), 0.12345679);
        assert_eq!(round(-0.123456784, 8), -0.12345678);
        assert_eq!(round(1.0, 8), 1.0);
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round(0.5, 0), 0.0);
        assert_eq!(round(1.5, 0), 2.0);
        assert_eq!(round(2.5, 0), 2.0);
        assert_eq!(round(-2.5, 0), -2.0);
    }

    #[test]
    fn test_round_non_finite() {
        assert!(round(f64::NAN, 8).is_nan());
        assert_eq!(round(f64::INFINITY, 8), f64::INFINITY);
        assert_eq!(round(1e300, 10), 1e300);
    }

    #[test]
    fn test_round_uses_exact_binary_value() {
        // each literal sits just off the decimal tie in binary
        assert_eq!(round(1.521924895, 8), 1.52192489);
        assert_eq!(round(1.303185945, 8), 1.30318595);
        assert_eq!(round(1.802854915, 8), 1.80285491);
    }
}
