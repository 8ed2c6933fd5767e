//! GST calculation.
//!
//! GST in India is levied as two halves, a central component (CGST)
//! and a state component (SGST).  The `tax` module turns a bill
//! subtotal and the owner's [`TaxConfig`] into a [`GstBreakdown`], and
//! validates a configuration before it is persisted.

use crate::error::{BillingError, Result};
use crate::models::{GstBreakdown, TaxConfig};
use crate::money::percent_of;
use rust_decimal::Decimal;

/// Compute the GST owed on `subtotal` under `config`.
///
/// When GST is disabled the zero breakdown is returned.  Otherwise each
/// component is `subtotal * component_rate / 100`, and the rates used
/// are copied into the result.  A negative subtotal is rejected since
/// prices and quantities never are.
pub fn calculate_gst(subtotal: Decimal, config: &TaxConfig) -> Result<GstBreakdown> {
    if subtotal < Decimal::ZERO {
        return Err(BillingError::NegativeAmount(subtotal));
    }
    if !config.enabled {
        return Ok(GstBreakdown::zero());
    }

    let cgst = percent_of(subtotal, config.cgst).ok_or(BillingError::AmountOverflow("CGST"))?;
    let sgst = percent_of(subtotal, config.sgst).ok_or(BillingError::AmountOverflow("SGST"))?;
    let total = cgst.checked_add(sgst).ok_or(BillingError::AmountOverflow("GST"))?;

    Ok(GstBreakdown {
        enabled: true,
        cgst,
        sgst,
        total,
        cgst_rate: config.cgst,
        sgst_rate: config.sgst,
        total_rate: config.rate,
        show_breakdown: config.show_breakdown,
    })
}

/// `subtotal` plus the GST owed on it.
pub fn calculate_total_with_gst(subtotal: Decimal, config: &TaxConfig) -> Result<Decimal> {
    let gst = calculate_gst(subtotal, config)?;
    subtotal
        .checked_add(gst.total)
        .ok_or(BillingError::AmountOverflow("bill total"))
}

/// Check a configuration before it is saved.
///
/// The rate must lie in `[0, 100]`, both components must be
/// non-negative, and together they must add up to the rate.
pub fn validate_tax_config(config: &TaxConfig) -> Result<()> {
    if config.rate < Decimal::ZERO || config.rate > Decimal::ONE_HUNDRED {
        return Err(BillingError::InvalidTaxRate(config.rate));
    }
    if config.cgst < Decimal::ZERO {
        return Err(BillingError::NegativeComponent("CGST"));
    }
    if config.sgst < Decimal::ZERO {
        return Err(BillingError::NegativeComponent("SGST"));
    }
    if config.cgst + config.sgst != config.rate {
        return Err(BillingError::RateSplitMismatch {
            rate: config.rate,
            cgst: config.cgst,
            sgst: config.sgst,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{round_money, MONEY_TOLERANCE};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_config_on_300() {
        let gst = calculate_gst(dec("300"), &TaxConfig::default()).unwrap();
        assert!(gst.enabled);
        assert_eq!(gst.cgst, dec("7.5"));
        assert_eq!(gst.sgst, dec("7.5"));
        assert_eq!(gst.total, dec("15"));
        assert_eq!(gst.total_rate, dec("5"));
        assert_eq!(gst.cgst_rate, dec("2.5"));
        assert!(gst.show_breakdown);
    }

    #[test]
    fn test_disabled_config_charges_nothing() {
        let gst = calculate_gst(dec("999.99"), &TaxConfig::disabled()).unwrap();
        assert_eq!(gst, GstBreakdown::zero());
        assert_eq!(
            calculate_total_with_gst(dec("999.99"), &TaxConfig::disabled()).unwrap(),
            dec("999.99")
        );
    }

    #[test]
    fn test_uneven_split_still_totals_rate() {
        let config = TaxConfig {
            enabled: true,
            rate: dec("12"),
            cgst: dec("5"),
            sgst: dec("7"),
            show_breakdown: false,
        };
        let subtotal = dec("1234.56");
        let gst = calculate_gst(subtotal, &config).unwrap();
        assert_eq!(gst.cgst + gst.sgst, gst.total);
        let expected = subtotal * config.rate / Decimal::ONE_HUNDRED;
        assert!((gst.total - expected).abs() <= MONEY_TOLERANCE);
        assert!(!gst.show_breakdown);
    }

    #[test]
    fn test_fractional_cents_are_kept_until_presentation() {
        let gst = calculate_gst(dec("33.33"), &TaxConfig::default()).unwrap();
        assert_eq!(gst.cgst, dec("0.83325"));
        assert_eq!(round_money(gst.total), dec("1.67"));
    }

    #[test]
    fn test_negative_subtotal_rejected() {
        let err = calculate_gst(dec("-1"), &TaxConfig::default()).unwrap_err();
        assert!(matches!(err, BillingError::NegativeAmount(_)));
    }

    #[test]
    fn test_huge_subtotal_is_an_error_not_a_panic() {
        let subtotal = dec("70000000000000000000000000000");
        let gst = calculate_gst(subtotal, &TaxConfig::default()).unwrap();
        assert_eq!(gst.total, dec("3500000000000000000000000000"));

        let full_rate = TaxConfig::default().with_rate(dec("100"));
        let err = calculate_total_with_gst(subtotal, &full_rate).unwrap_err();
        assert!(matches!(err, BillingError::AmountOverflow(_)));
        assert!(err.is_validation());

        let unchecked = TaxConfig {
            cgst: dec("200"),
            ..TaxConfig::default()
        };
        let err = calculate_gst(subtotal, &unchecked).unwrap_err();
        assert!(matches!(err, BillingError::AmountOverflow("CGST")));
    }

    #[test]
    fn test_validate_rate_bounds() {
        assert!(validate_tax_config(&TaxConfig::default()).is_ok());
        assert!(validate_tax_config(&TaxConfig::default().with_rate(dec("0"))).is_ok());
        assert!(validate_tax_config(&TaxConfig::default().with_rate(dec("100"))).is_ok());

        let err = validate_tax_config(&TaxConfig::default().with_rate(dec("100.5"))).unwrap_err();
        assert!(matches!(err, BillingError::InvalidTaxRate(_)));
        assert!(err.is_validation());

        let err = validate_tax_config(&TaxConfig::default().with_rate(dec("-5"))).unwrap_err();
        assert!(matches!(err, BillingError::InvalidTaxRate(_)));
    }

    #[test]
    fn test_validate_split_mismatch() {
        let config = TaxConfig {
            cgst: dec("3"),
            ..TaxConfig::default()
        };
        let err = validate_tax_config(&config).unwrap_err();
        assert!(matches!(err, BillingError::RateSplitMismatch { .. }));
    }
}
