//! Donation amount and currency value objects.
//!
//! Amounts are carried in major currency units as decimals. Gateways that
//! bill in minor units (Stripe cents, Khalti paisa) convert at the adapter
//! boundary via [`Amount::minor_units`], which rounds deterministically.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::DomainError;

/// Supported settlement currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "NPR")]
    Npr,
}

impl Currency {
    /// Returns the ISO 4217 code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Npr => "NPR",
        }
    }

    /// Parses an ISO 4217 code.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Some(Currency::Usd),
            "NPR" => Some(Currency::Npr),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Positive monetary amount in major currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Creates an amount, rejecting zero and negative values.
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::validation(
                "amount",
                "Amount must be a positive number",
            ));
        }
        Ok(Self(value))
    }

    /// Returns the decimal value in major units.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Converts to minor units (cents / paisa).
    ///
    /// Rounds half-away-from-zero so the same major amount always maps to
    /// the same minor amount, regardless of the decimal scale it arrived
    /// with.
    pub fn minor_units(&self) -> i64 {
        (self.0 * Decimal::from(100))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(i64::MAX)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.round_dp(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn amount(s: &str) -> Amount {
        Amount::new(Decimal::from_str(s).unwrap()).unwrap()
    }

    #[test]
    fn rejects_zero_amount() {
        assert!(Amount::new(Decimal::ZERO).is_err());
    }

    #[test]
    fn rejects_negative_amount() {
        assert!(Amount::new(Decimal::from_str("-5").unwrap()).is_err());
    }

    #[test]
    fn minor_units_for_whole_amount() {
        assert_eq!(amount("25.00").minor_units(), 2500);
        assert_eq!(amount("25").minor_units(), 2500);
    }

    #[test]
    fn minor_units_round_midpoint_away_from_zero() {
        assert_eq!(amount("10.005").minor_units(), 1001);
        assert_eq!(amount("10.004").minor_units(), 1000);
    }

    #[test]
    fn currency_parse_is_case_insensitive() {
        assert_eq!(Currency::parse("usd"), Some(Currency::Usd));
        assert_eq!(Currency::parse("NPR"), Some(Currency::Npr));
        assert_eq!(Currency::parse("EUR"), None);
    }

    #[test]
    fn display_rounds_to_two_decimal_places() {
        assert_eq!(amount("100.5").to_string(), "100.5");
        assert_eq!(amount("100.507").to_string(), "100.51");
    }

    proptest! {
        #[test]
        fn minor_units_are_deterministic(cents in 1i64..10_000_000) {
            // Same major value expressed at different scales converts equally.
            let a = Amount::new(Decimal::new(cents, 2)).unwrap();
            let b = Amount::new(Decimal::new(cents * 10, 3)).unwrap();
            prop_assert_eq!(a.minor_units(), cents);
            prop_assert_eq!(a.minor_units(), b.minor_units());
        }
    }
}
