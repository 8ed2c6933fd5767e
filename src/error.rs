//! Error types for the billing library.

use rust_decimal::Decimal;
use thiserror::Error;

/// Billing error types
#[derive(Debug, Error)]
pub enum BillingError {
    /// Tax rate outside of `[0, 100]`
    #[error("GST rate must be between 0% and 100%, got {0}%")]
    InvalidTaxRate(Decimal),

    /// CGST and SGST do not add up to the configured rate
    #[error("CGST ({cgst}%) + SGST ({sgst}%) must equal the GST rate ({rate}%)")]
    RateSplitMismatch {
        rate: Decimal,
        cgst: Decimal,
        sgst: Decimal,
    },

    /// A CGST or SGST component below zero
    #[error("{0} rate must be non-negative")]
    NegativeComponent(&'static str),

    /// Tax requested on a negative amount
    #[error("amount must be non-negative, got {0}")]
    NegativeAmount(Decimal),

    /// An amount too large to represent
    #[error("amount out of range while computing {0}")]
    AmountOverflow(&'static str),

    /// Settings that are not a valid tax configuration
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// IO error while reading or writing settings
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Settings could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BillingError {
    /// Whether the error stems from user-supplied values rather than the
    /// environment.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BillingError::InvalidTaxRate(_)
                | BillingError::RateSplitMismatch { .. }
                | BillingError::NegativeComponent(_)
                | BillingError::NegativeAmount(_)
                | BillingError::AmountOverflow(_)
                | BillingError::InvalidSettings(_)
        )
    }
}

/// Result type for billing operations
pub type Result<T> = std::result::Result<T, BillingError>;
