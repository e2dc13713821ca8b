//! Payment gateway configuration
//!
//! Provider secrets are read from the documented environment variables.
//! A missing secret never fails startup; it only removes that provider
//! from the configured set, which in turn keeps it out of the enabled set
//! the resolver exposes to donors.

use secrecy::SecretString;

use crate::domain::donation::{ConfiguredProviders, PaymentMode};

/// Stripe credentials.
#[derive(Clone)]
pub struct StripeCredentials {
    /// Secret API key (`sk_live_...` / `sk_test_...`)
    pub secret_key: SecretString,

    /// Webhook signing secret (`whsec_...`)
    pub webhook_secret: SecretString,
}

/// Khalti credentials.
#[derive(Clone)]
pub struct KhaltiCredentials {
    /// Merchant secret key, sent as `Authorization: Key ...`
    pub secret_key: SecretString,

    /// API base URL override
    pub base_url: String,
}

/// eSewa credentials.
#[derive(Clone)]
pub struct EsewaCredentials {
    /// Merchant / product code
    pub merchant_id: String,

    /// Shared secret for the form signature
    pub secret_key: SecretString,

    /// Gateway base URL
    pub base_url: String,
}

/// Payment configuration assembled from the environment.
#[derive(Clone, Default)]
pub struct PaymentConfig {
    /// Global mock/live mode (`PAYMENT_MODE`, defaults to mock)
    pub mode: PaymentMode,

    pub stripe: Option<StripeCredentials>,
    pub khalti: Option<KhaltiCredentials>,
    pub esewa: Option<EsewaCredentials>,
}

impl PaymentConfig {
    /// Reads provider credentials from the environment.
    ///
    /// Variables:
    /// - `PAYMENT_MODE` (`mock` | `live`, default `mock`)
    /// - `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`
    /// - `KHALTI_SECRET_KEY`, `KHALTI_BASE_URL` (optional override)
    /// - `ESEWA_MERCHANT_ID`, `ESEWA_SECRET_KEY`, `ESEWA_BASE_URL`
    pub fn from_env() -> Self {
        use std::env::var;

        let mode = PaymentMode::parse(&var("PAYMENT_MODE").unwrap_or_else(|_| "mock".into()));

        let stripe = match (var("STRIPE_SECRET_KEY"), var("STRIPE_WEBHOOK_SECRET")) {
            (Ok(secret_key), Ok(webhook_secret)) => Some(StripeCredentials {
                secret_key: SecretString::new(secret_key),
                webhook_secret: SecretString::new(webhook_secret),
            }),
            _ => None,
        };

        let khalti = var("KHALTI_SECRET_KEY").ok().map(|secret_key| KhaltiCredentials {
            secret_key: SecretString::new(secret_key),
            base_url: var("KHALTI_BASE_URL")
                .unwrap_or_else(|_| "https://khalti.com/api/v2".into()),
        });

        let esewa = match (var("ESEWA_MERCHANT_ID"), var("ESEWA_SECRET_KEY")) {
            (Ok(merchant_id), Ok(secret_key)) => Some(EsewaCredentials {
                merchant_id,
                secret_key: SecretString::new(secret_key),
                base_url: var("ESEWA_BASE_URL")
                    .unwrap_or_else(|_| "https://esewa.com.np".into()),
            }),
            _ => None,
        };

        Self {
            mode,
            stripe,
            khalti,
            esewa,
        }
    }

    /// Which providers have their required secrets present.
    pub fn configured_providers(&self) -> ConfiguredProviders {
        ConfiguredProviders {
            stripe: self.stripe.is_some(),
            khalti: self.khalti.is_some(),
            esewa: self.esewa.is_some(),
        }
    }
}

impl std::fmt::Debug for PaymentConfig {
    // Secrets stay out of Debug output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("mode", &self.mode)
            .field("stripe", &self.stripe.is_some())
            .field("khalti", &self.khalti.is_some())
            .field("esewa", &self.esewa.is_some())
            .finish()
    }
}
