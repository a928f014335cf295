//! Validated monetary amounts.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts wrap `rust_decimal::Decimal` and are checked once at the boundary.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of fractional digits an amount may carry.
///
/// Matches the `NUMERIC(19,4)` columns in the ledger schema.
pub const MONEY_SCALE: u32 = 4;

/// Largest amount or balance the ledger can hold: 999,999,999,999,999.9999.
///
/// Matches the `NUMERIC(19,4)` columns in the ledger schema.
pub const MAX_AMOUNT: Decimal =
    Decimal::from_parts(0x89E7_FFFF, 0x8AC7_2304, 0, false, MONEY_SCALE);

/// Reasons a raw value cannot be used as a monetary amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The value is not a number, or is not finite.
    #[error("Amount is not a finite number")]
    NotANumber,

    /// The value is zero or negative.
    #[error("Amount must be greater than zero")]
    NotPositive,

    /// The value has more fractional digits than the ledger stores.
    #[error("Amount cannot have more than {MONEY_SCALE} decimal places")]
    TooPrecise,

    /// The value is above [`MAX_AMOUNT`].
    #[error("Amount cannot exceed {MAX_AMOUNT}")]
    TooLarge,
}

/// A strictly positive amount with at most [`MONEY_SCALE`] decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct PositiveAmount(Decimal);

impl PositiveAmount {
    /// Validates a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive, too precise or too large.
    pub fn new(amount: Decimal) -> Result<Self, AmountError> {
        if amount <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }
        if amount > MAX_AMOUNT {
            return Err(AmountError::TooLarge);
        }
        let normalized = amount.normalize();
        if normalized.scale() > MONEY_SCALE {
            return Err(AmountError::TooPrecise);
        }
        Ok(Self(normalized))
    }

    /// Validates a floating-point amount coming from a loosely typed caller.
    ///
    /// `NaN` and infinities are rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite, not positive, too precise or too large.
    pub fn from_f64(value: f64) -> Result<Self, AmountError> {
        let amount = Decimal::from_f64(value).ok_or(AmountError::NotANumber)?;
        Self::new(amount)
    }

    /// Returns the inner decimal.
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }
}

impl FromStr for PositiveAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| AmountError::NotANumber)?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for PositiveAmount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PositiveAmount> for Decimal {
    fn from(value: PositiveAmount) -> Self {
        value.0
    }
}

impl std::fmt::Display for PositiveAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_positive_amount_accepts_positive_values() {
        let amount = PositiveAmount::new(dec!(100.50)).unwrap();
        assert_eq!(amount.get(), dec!(100.5));
    }

    #[test]
    fn test_positive_amount_rejects_zero_and_negative() {
        assert_eq!(PositiveAmount::new(Decimal::ZERO), Err(AmountError::NotPositive));
        assert_eq!(PositiveAmount::new(dec!(-0.01)), Err(AmountError::NotPositive));
    }

    #[test]
    fn test_positive_amount_rejects_excess_precision() {
        assert_eq!(PositiveAmount::new(dec!(1.00001)), Err(AmountError::TooPrecise));
        // Trailing zeros do not count against the scale.
        assert!(PositiveAmount::new(dec!(1.000100)).is_ok());
    }

    #[test]
    fn test_positive_amount_upper_bound() {
        assert_eq!(MAX_AMOUNT.to_string(), "999999999999999.9999");
        assert_eq!(PositiveAmount::new(MAX_AMOUNT).unwrap().get(), MAX_AMOUNT);
        assert_eq!(
            PositiveAmount::new(MAX_AMOUNT + dec!(0.0001)),
            Err(AmountError::TooLarge)
        );
        assert_eq!(PositiveAmount::new(Decimal::MAX), Err(AmountError::TooLarge));
        assert_eq!(
            "1000000000000000".parse::<PositiveAmount>(),
            Err(AmountError::TooLarge)
        );
    }

    #[test]
    fn test_positive_amount_from_f64() {
        assert_eq!(PositiveAmount::from_f64(50.0).unwrap().get(), dec!(50));
        assert_eq!(PositiveAmount::from_f64(0.1).unwrap().get(), dec!(0.1));
        assert_eq!(PositiveAmount::from_f64(f64::NAN), Err(AmountError::NotANumber));
        assert_eq!(
            PositiveAmount::from_f64(f64::INFINITY),
            Err(AmountError::NotANumber)
        );
        assert_eq!(PositiveAmount::from_f64(-3.0), Err(AmountError::NotPositive));
    }

    #[test]
    fn test_positive_amount_from_str() {
        assert_eq!(
            " 30.25 ".parse::<PositiveAmount>().unwrap().get(),
            dec!(30.25)
        );
        assert_eq!("abc".parse::<PositiveAmount>(), Err(AmountError::NotANumber));
        assert_eq!("".parse::<PositiveAmount>(), Err(AmountError::NotANumber));
        assert_eq!("0".parse::<PositiveAmount>(), Err(AmountError::NotPositive));
    }

    #[test]
    fn test_positive_amount_serde_rejects_invalid() {
        let parsed: PositiveAmount = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(parsed.get(), dec!(12.5));
        assert!(serde_json::from_str::<PositiveAmount>("\"-1\"").is_err());
    }
}
