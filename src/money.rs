//! Money Representation
//!
//! All balances and transfer amounts are held as `u64` minor units (cents,
//! two decimal places). Conversion to and from the client-facing decimal
//! representation happens only at the serde boundary; balance arithmetic is
//! integer arithmetic and therefore exact.
//!
//! ## Usage
//! ```text
//! let amount = Amount::parse("42.75")?;
//! assert_eq!(amount.cents(), 4275);
//! assert_eq!(amount.to_string(), "42.75");
//! ```

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fractional digits carried by every balance and transfer amount.
pub const DECIMALS: u32 = 2;

const CENTS_PER_UNIT: u64 = 100;

/// Money conversion errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount must be positive")]
    NotPositive,

    #[error("precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("amount too large, would overflow")]
    Overflow,

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

/// A non-negative money value in minor units (cents).
///
/// `Amount` cannot represent a negative balance; the type itself enforces the
/// `balance >= 0` invariant. Serialized as a 2-decimal string ("57.25") to
/// preserve precision across JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Build from raw minor units.
    pub const fn from_cents(cents: u64) -> Self {
        Amount(cents)
    }

    /// Raw minor units.
    pub const fn cents(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Convert a boundary decimal into minor units.
    ///
    /// Rejects non-positive values and values with more than two fractional
    /// digits; there is no silent truncation.
    pub fn from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        if value <= Decimal::ZERO {
            return Err(MoneyError::NotPositive);
        }

        // Trailing zeros don't count against precision ("1.50" == "1.5").
        let normalized = value.normalize();
        if normalized.scale() > DECIMALS {
            return Err(MoneyError::PrecisionOverflow {
                provided: normalized.scale(),
                max: DECIMALS,
            });
        }

        let cents = (normalized * Decimal::from(CENTS_PER_UNIT))
            .to_u64()
            .ok_or(MoneyError::Overflow)?;
        Ok(Amount(cents))
    }

    /// Parse a client-provided string amount ("42.75", "100").
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(MoneyError::InvalidFormat("empty string".into()));
        }
        let value =
            Decimal::from_str(input).map_err(|e| MoneyError::InvalidFormat(e.to_string()))?;
        Self::from_decimal(value)
    }

    pub fn checked_add(self, other: Amount) -> Result<Amount, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(MoneyError::Overflow)
    }

    pub fn checked_sub(self, other: Amount) -> Result<Amount, MoneyError> {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or(MoneyError::NotPositive)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / CENTS_PER_UNIT, self.0 % CENTS_PER_UNIT)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        // Accept both JSON string and JSON number, like the rest of the API.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum DecimalOrString {
            String(String),
            Number(Decimal),
        }

        let value = match DecimalOrString::deserialize(deserializer)? {
            DecimalOrString::String(s) => {
                Decimal::from_str(s.trim()).map_err(|e| D::Error::custom(e.to_string()))?
            }
            DecimalOrString::Number(d) => d,
        };

        Amount::from_decimal(value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_units() {
        assert_eq!(Amount::parse("100").unwrap().cents(), 10_000);
        assert_eq!(Amount::parse("1").unwrap().cents(), 100);
    }

    #[test]
    fn test_parse_fractional() {
        assert_eq!(Amount::parse("42.75").unwrap().cents(), 4275);
        assert_eq!(Amount::parse("0.01").unwrap().cents(), 1);
        // Trailing zeros are not precision overflow
        assert_eq!(Amount::parse("1.50").unwrap().cents(), 150);
        assert_eq!(Amount::parse("1.500").unwrap().cents(), 150);
    }

    #[test]
    fn test_parse_rejects_non_positive() {
        assert_eq!(Amount::parse("0"), Err(MoneyError::NotPositive));
        assert_eq!(Amount::parse("0.00"), Err(MoneyError::NotPositive));
        assert_eq!(Amount::parse("-5"), Err(MoneyError::NotPositive));
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        assert_eq!(
            Amount::parse("1.005"),
            Err(MoneyError::PrecisionOverflow { provided: 3, max: 2 })
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(Amount::parse(""), Err(MoneyError::InvalidFormat(_))));
        assert!(matches!(Amount::parse("abc"), Err(MoneyError::InvalidFormat(_))));
        assert!(matches!(Amount::parse("1.2.3"), Err(MoneyError::InvalidFormat(_))));
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Amount::from_cents(5725).to_string(), "57.25");
        assert_eq!(Amount::from_cents(10_000).to_string(), "100.00");
        assert_eq!(Amount::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::from_cents(10_000);
        let b = Amount::from_cents(4275);
        assert_eq!(a.checked_sub(b).unwrap().cents(), 5725);
        assert_eq!(b.checked_add(a).unwrap().cents(), 14_275);
        assert!(b.checked_sub(a).is_err());
        assert!(
            Amount::from_cents(u64::MAX)
                .checked_add(Amount::from_cents(1))
                .is_err()
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let amount = Amount::from_cents(4275);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, r#""42.75""#);

        let from_string: Amount = serde_json::from_str(r#""42.75""#).unwrap();
        assert_eq!(from_string, amount);

        // JSON numbers are accepted too
        let from_number: Amount = serde_json::from_str("42.75").unwrap();
        assert_eq!(from_number, amount);
    }
}
