//! Money helpers using decimal arithmetic.
//!
//! All cart math is done in exact [`Decimal`] values. Rounding to cents only
//! happens at the edges (display strings and wire amounts) using
//! half-away-from-zero, so recomputing totals any number of times never
//! compounds rounding error.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`TaxRate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxRateError {
    /// The rate is below zero.
    #[error("tax rate cannot be negative (got {0})")]
    Negative(Decimal),
    /// The rate is 100% or more, which is almost certainly a percent/fraction mixup.
    #[error("tax rate must be a fraction below 1 (got {0})")]
    TooLarge(Decimal),
}

/// Sales tax rate applied to the cart subtotal, as a fraction (`0.085` = 8.5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Create a tax rate from a fraction in `[0, 1)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate is negative or not below one.
    pub fn new(rate: Decimal) -> Result<Self, TaxRateError> {
        if rate.is_sign_negative() && !rate.is_zero() {
            return Err(TaxRateError::Negative(rate));
        }
        if rate >= Decimal::ONE {
            return Err(TaxRateError::TooLarge(rate));
        }
        Ok(Self(rate))
    }

    /// The rate as a fraction.
    #[must_use]
    pub const fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Tax owed on `amount`, unrounded.
    #[must_use]
    pub fn tax_on(self, amount: Decimal) -> Decimal {
        amount * self.0
    }
}

impl Default for TaxRate {
    /// 8.5% sales tax.
    fn default() -> Self {
        Self(Decimal::new(85, 3))
    }
}

impl TryFrom<Decimal> for TaxRate {
    type Error = TaxRateError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaxRate> for Decimal {
    fn from(rate: TaxRate) -> Self {
        rate.0
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}

/// Round an amount to cents, half away from zero.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount for display, e.g. `$12.98`.
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    let rounded = round_cents(amount);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${:.2}", rounded.abs())
    } else {
        format!("${rounded:.2}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tax_rate() {
        assert_eq!(TaxRate::default().as_decimal(), Decimal::new(85, 3));
        assert_eq!(TaxRate::default().to_string(), "8.5%");
    }

    #[test]
    fn test_tax_rate_bounds() {
        assert!(TaxRate::new(Decimal::ZERO).is_ok());
        assert!(matches!(
            TaxRate::new(Decimal::new(-1, 2)),
            Err(TaxRateError::Negative(_))
        ));
        assert!(matches!(
            TaxRate::new(Decimal::new(85, 1)),
            Err(TaxRateError::TooLarge(_))
        ));
    }

    #[test]
    fn test_tax_rate_deserialize_validates() {
        let rate: TaxRate = serde_json::from_str("\"0.07\"").unwrap();
        assert_eq!(rate.as_decimal(), Decimal::new(7, 2));
        assert!(serde_json::from_str::<TaxRate>("\"1.5\"").is_err());
    }

    #[test]
    fn test_round_cents_half_away_from_zero() {
        assert_eq!(round_cents(Decimal::new(10166, 4)), Decimal::new(102, 2));
        assert_eq!(round_cents(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(round_cents(Decimal::new(1004, 3)), Decimal::new(100, 2));
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Decimal::new(129_766, 4)), "$12.98");
        assert_eq!(format_price(Decimal::ZERO), "$0.00");
        assert_eq!(format_price(Decimal::new(5, 0)), "$5.00");
        assert_eq!(format_price(Decimal::new(-250, 2)), "-$2.50");
    }
}
