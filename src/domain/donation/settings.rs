//! Payment settings and the per-request configuration resolver.
//!
//! Two inputs determine what a donor can actually pay with:
//!
//! - the persisted [`PaymentSettings`] record, written through the
//!   role-gated admin endpoint (which providers are toggled on, which is
//!   primary, default currency, recurring policy);
//! - the environment: which providers have their required secrets
//!   configured, and the global mock/live mode.
//!
//! [`resolve`] combines both into a [`ResolvedPaymentConfig`]. Resolution
//! happens once per handler invocation and the result is passed down; there
//! is no process-wide mutable configuration.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::amount::Currency;
use super::provider::Provider;

/// Global operating mode for all gateways.
///
/// In mock mode adapters short-circuit external calls and reconcilers
/// complete deterministically, so the full donation flow can run in local
/// and integration-test environments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    #[default]
    Mock,
    Live,
}

impl PaymentMode {
    pub fn is_mock(&self) -> bool {
        matches!(self, PaymentMode::Mock)
    }

    /// Parses a mode name, defaulting unknown values to mock so a typo in
    /// deployment config can never silently go live.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "live" => PaymentMode::Live,
            _ => PaymentMode::Mock,
        }
    }
}

/// Which providers have their required environment secrets present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfiguredProviders {
    pub stripe: bool,
    pub khalti: bool,
    pub esewa: bool,
}

impl ConfiguredProviders {
    /// Whether the given provider's secrets are configured.
    pub fn contains(&self, provider: Provider) -> bool {
        match provider {
            Provider::Stripe => self.stripe,
            Provider::Khalti => self.khalti,
            Provider::Esewa => self.esewa,
        }
    }
}

/// The persisted payment settings record, managed by administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSettings {
    /// Providers the administrators have toggled on.
    pub enabled_providers: Vec<Provider>,

    /// Provider shown first on the donation form.
    pub primary_provider: Provider,

    /// Default currency for providers that support more than NPR.
    pub default_currency: Currency,

    /// Whether monthly donations may be offered.
    pub allow_recurring: bool,

    pub updated_at: Timestamp,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            enabled_providers: Provider::all().to_vec(),
            primary_provider: Provider::Stripe,
            default_currency: Currency::Usd,
            allow_recurring: true,
            updated_at: Timestamp::now(),
        }
    }
}

/// The effective payment configuration for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaymentConfig {
    pub mode: PaymentMode,

    /// Providers that are both administratively enabled and have secrets
    /// configured. Only these may be offered to donors.
    pub enabled: Vec<Provider>,

    /// The primary provider, if it survived the intersection.
    pub primary: Option<Provider>,

    pub default_currency: Currency,
    pub allow_recurring: bool,
}

impl ResolvedPaymentConfig {
    /// Whether the provider may process a donation right now.
    pub fn is_enabled(&self, provider: Provider) -> bool {
        self.enabled.contains(&provider)
    }

    /// The currency a donation through `provider` settles in.
    pub fn currency_for(&self, provider: Provider) -> Currency {
        provider.settlement_currency(self.default_currency)
    }
}

/// Combines environment state and persisted settings into the effective
/// configuration.
///
/// In live mode a provider with missing secrets is excluded regardless of
/// its admin toggle: donors must never be offered a method that cannot
/// actually process payment. Mock-mode adapters bypass credentials, so
/// there the admin toggles alone decide.
pub fn resolve(
    mode: PaymentMode,
    configured: &ConfiguredProviders,
    settings: &PaymentSettings,
) -> ResolvedPaymentConfig {
    let enabled: Vec<Provider> = settings
        .enabled_providers
        .iter()
        .copied()
        .filter(|p| mode.is_mock() || configured.contains(*p))
        .collect();

    let primary = if enabled.contains(&settings.primary_provider) {
        Some(settings.primary_provider)
    } else {
        enabled.first().copied()
    };

    ResolvedPaymentConfig {
        mode,
        enabled,
        primary,
        default_currency: settings.default_currency,
        allow_recurring: settings.allow_recurring,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_configured() -> ConfiguredProviders {
        ConfiguredProviders {
            stripe: true,
            khalti: true,
            esewa: true,
        }
    }

    #[test]
    fn mode_parse_defaults_to_mock() {
        assert_eq!(PaymentMode::parse("live"), PaymentMode::Live);
        assert_eq!(PaymentMode::parse("LIVE"), PaymentMode::Live);
        assert_eq!(PaymentMode::parse("mock"), PaymentMode::Mock);
        assert_eq!(PaymentMode::parse("prod"), PaymentMode::Mock);
    }

    #[test]
    fn resolve_intersects_toggles_and_secrets() {
        let configured = ConfiguredProviders {
            stripe: true,
            khalti: false,
            esewa: true,
        };
        let settings = PaymentSettings::default();

        let resolved = resolve(PaymentMode::Live, &configured, &settings);

        assert!(resolved.is_enabled(Provider::Stripe));
        assert!(!resolved.is_enabled(Provider::Khalti));
        assert!(resolved.is_enabled(Provider::Esewa));
    }

    #[test]
    fn admin_toggle_cannot_enable_unconfigured_provider() {
        let configured = ConfiguredProviders::default();
        let settings = PaymentSettings::default();

        let resolved = resolve(PaymentMode::Live, &configured, &settings);

        assert!(resolved.enabled.is_empty());
        assert_eq!(resolved.primary, None);
    }

    #[test]
    fn mock_mode_enables_toggled_providers_without_secrets() {
        let configured = ConfiguredProviders::default();
        let settings = PaymentSettings::default();

        let resolved = resolve(PaymentMode::Mock, &configured, &settings);

        assert_eq!(resolved.enabled.len(), 3);
        assert_eq!(resolved.primary, Some(Provider::Stripe));
    }

    #[test]
    fn missing_secrets_cannot_be_overridden_by_toggle() {
        let configured = ConfiguredProviders {
            stripe: false,
            khalti: true,
            esewa: true,
        };
        let settings = PaymentSettings {
            enabled_providers: vec![Provider::Stripe],
            ..Default::default()
        };

        let resolved = resolve(PaymentMode::Live, &configured, &settings);
        assert!(resolved.enabled.is_empty());
    }

    #[test]
    fn primary_falls_back_when_not_enabled() {
        let configured = ConfiguredProviders {
            stripe: false,
            khalti: true,
            esewa: true,
        };
        let settings = PaymentSettings {
            primary_provider: Provider::Stripe,
            ..Default::default()
        };

        let resolved = resolve(PaymentMode::Live, &configured, &settings);
        assert_eq!(resolved.primary, Some(Provider::Khalti));
    }

    #[test]
    fn currency_policy_is_fixed_per_provider() {
        let resolved = resolve(
            PaymentMode::Live,
            &all_configured(),
            &PaymentSettings::default(),
        );

        assert_eq!(resolved.currency_for(Provider::Stripe), Currency::Usd);
        assert_eq!(resolved.currency_for(Provider::Khalti), Currency::Npr);
        assert_eq!(resolved.currency_for(Provider::Esewa), Currency::Npr);
    }

    #[test]
    fn disabled_toggle_excludes_configured_provider() {
        let settings = PaymentSettings {
            enabled_providers: vec![Provider::Khalti, Provider::Esewa],
            ..Default::default()
        };

        let resolved = resolve(PaymentMode::Live, &all_configured(), &settings);
        assert!(!resolved.is_enabled(Provider::Stripe));
        assert!(resolved.is_enabled(Provider::Khalti));
    }
}
