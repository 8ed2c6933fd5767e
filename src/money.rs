//! Money helpers.
//!
//! Amounts are aggregated as unrounded [`Decimal`]s; rounding to cents
//! only happens when a value leaves the pipeline for display.

use rust_decimal::prelude::*;

/// Number of decimal places shown for monetary values
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Round a monetary value to two decimal places, half away from zero.
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `value * rate / 100`, the way every percentage in billing is applied.
/// `None` if the result does not fit in a [`Decimal`].
#[inline]
pub fn percent_of(value: Decimal, rate: Decimal) -> Option<Decimal> {
    value.checked_mul(rate.checked_div(Decimal::ONE_HUNDRED)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(round_money(Decimal::new(1004, 3)), Decimal::new(100, 2));
        assert_eq!(round_money(Decimal::new(525, 1)), Decimal::new(525, 1));
    }

    #[test]
    fn test_percent_of_is_exact() {
        // 2.5% of 0.10 is a fraction of a cent that f64 cannot hold exactly
        let amount = percent_of(Decimal::new(10, 2), Decimal::new(25, 1));
        assert_eq!(amount, Some(Decimal::new(25, 4)));
    }

    #[test]
    fn test_percent_of_large_values() {
        // 5% of 2e28 fits even though 2e28 * 5 does not
        let value = Decimal::from_i128_with_scale(20_000_000_000_000_000_000_000_000_000, 0);
        let expected = Decimal::from_i128_with_scale(1_000_000_000_000_000_000_000_000_000, 0);
        assert_eq!(percent_of(value, Decimal::new(5, 0)), Some(expected));
        assert_eq!(percent_of(Decimal::MAX, Decimal::new(200, 0)), None);
    }

    #[test]
    fn test_accumulation_precision() {
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += Decimal::new(1, 2);
        }
        assert_eq!(total, Decimal::new(10, 0));
        assert!((total - Decimal::TEN).abs() < MONEY_TOLERANCE);
    }
}
