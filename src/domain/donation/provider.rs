//! Payment provider identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::amount::Currency;

/// The payment gateways a donation can be routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Stripe,
    Khalti,
    Esewa,
}

impl Provider {
    /// Returns the wire/storage name of the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Stripe => "stripe",
            Provider::Khalti => "khalti",
            Provider::Esewa => "esewa",
        }
    }

    /// Parses a provider name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stripe" => Some(Provider::Stripe),
            "khalti" => Some(Provider::Khalti),
            "esewa" => Some(Provider::Esewa),
            _ => None,
        }
    }

    /// All known providers, in display order.
    pub fn all() -> [Provider; 3] {
        [Provider::Stripe, Provider::Khalti, Provider::Esewa]
    }

    /// The currency a transaction through this provider settles in.
    ///
    /// Khalti and eSewa operate only in NPR; Stripe uses the configured
    /// default. This is a fixed business rule, not donor-selectable.
    pub fn settlement_currency(&self, default: Currency) -> Currency {
        match self {
            Provider::Stripe => default,
            Provider::Khalti | Provider::Esewa => Currency::Npr,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
