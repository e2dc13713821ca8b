//! Axum router configuration for donation endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    esewa_failure, esewa_success, get_donation, get_payment_options, get_payment_settings,
    list_donations, start_donation, stripe_webhook, update_payment_settings,
    verify_khalti_payment, DonationAppState,
};

/// Donor-facing donation routes.
///
/// - `POST /` - Start a donation
/// - `GET /options` - Payment options for the donation form
/// - `GET /:id` - Donation status for the landing pages
pub fn donation_routes() -> Router<DonationAppState> {
    Router::new()
        .route("/", post(start_donation))
        .route("/options", get(get_payment_options))
        .route("/:id", get(get_donation))
}

/// Gateway callback routes (no user auth; each handler verifies with its
/// provider).
///
/// - `POST /khalti/verify` - Client-invoked Khalti verification
/// - `GET /esewa/success` - eSewa success redirect
/// - `GET /esewa/failure` - eSewa failure redirect
pub fn payment_callback_routes() -> Router<DonationAppState> {
    Router::new()
        .route("/khalti/verify", post(verify_khalti_payment))
        .route("/esewa/success", get(esewa_success))
        .route("/esewa/failure", get(esewa_failure))
}

/// Webhook routes (signature verified, no user auth).
///
/// - `POST /stripe` - Stripe webhook deliveries
pub fn webhook_routes() -> Router<DonationAppState> {
    Router::new().route("/stripe", post(stripe_webhook))
}

/// Admin back-office routes (bearer token with admin role).
///
/// - `GET /donations` - Recent donations listing
/// - `GET /payment-settings` - Current payment settings
/// - `PUT /payment-settings` - Replace payment settings
pub fn admin_routes() -> Router<DonationAppState> {
    Router::new()
        .route("/donations", get(list_donations))
        .route(
            "/payment-settings",
            get(get_payment_settings).put(update_payment_settings),
        )
}

/// Complete donation module router, mounted at `/api`.
pub fn donation_router() -> Router<DonationAppState> {
    Router::new()
        .nest("/donations", donation_routes())
        .nest("/payments", payment_callback_routes())
        .nest("/webhooks", webhook_routes())
        .nest("/admin", admin_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::esewa::{EsewaGateway, EsewaGatewayConfig};
    use crate::adapters::khalti::{KhaltiGateway, KhaltiGatewayConfig};
    use crate::adapters::stripe::{StripeGateway, StripeGatewayConfig};
    use crate::application::handlers::donation::testing::{
        InMemoryDonationRepository, InMemorySettingsRepository,
    };
    use crate::domain::donation::{ConfiguredProviders, PaymentMode};
    use crate::ports::{DonationReader, DonationSummary, GatewayRegistry};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EmptyReader;

    #[async_trait]
    impl DonationReader for EmptyReader {
        async fn list_recent(
            &self,
            _limit: i64,
            _offset: i64,
        ) -> Result<Vec<DonationSummary>, crate::domain::foundation::DomainError> {
            Ok(vec![])
        }

        async fn count(&self) -> Result<i64, crate::domain::foundation::DomainError> {
            Ok(0)
        }
    }

    fn test_state() -> DonationAppState {
        let stripe = Arc::new(StripeGateway::new(StripeGatewayConfig::new(
            None,
            PaymentMode::Mock,
            "https://sahayog.org/donate/success",
            "https://sahayog.org/donate/cancelled",
        )));
        let khalti = Arc::new(KhaltiGateway::new(KhaltiGatewayConfig {
            credentials: None,
            mode: PaymentMode::Mock,
            return_url: "https://sahayog.org/donate/khalti/return".to_string(),
            website_url: "https://sahayog.org".to_string(),
        }));
        let esewa = Arc::new(EsewaGateway::new(EsewaGatewayConfig {
            credentials: None,
            mode: PaymentMode::Mock,
            success_callback_url: "https://api.sahayog.org/api/payments/esewa/success"
                .to_string(),
            failure_callback_url: "https://api.sahayog.org/api/payments/esewa/failure"
                .to_string(),
        }));

        let mut registry = GatewayRegistry::new();
        registry.register(stripe.clone());
        registry.register(khalti.clone());
        registry.register(esewa.clone());

        DonationAppState {
            repository: Arc::new(InMemoryDonationRepository::new()),
            reader: Arc::new(EmptyReader),
            settings_repository: Arc::new(InMemorySettingsRepository::new()),
            registry,
            stripe_events: stripe,
            khalti_lookup: khalti,
            esewa_verification: esewa,
            mode: PaymentMode::Mock,
            configured: ConfiguredProviders::default(),
            admin_jwt_secret: "test-secret-test-secret-test-secret!".to_string(),
            site_url: "https://sahayog.org".to_string(),
        }
    }

    #[test]
    fn donation_routes_create_router() {
        let router = donation_routes();
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn callback_routes_create_router() {
        let router = payment_callback_routes();
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn webhook_routes_create_router() {
        let router = webhook_routes();
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn admin_routes_create_router() {
        let router = admin_routes();
        let _: Router<()> = router.with_state(test_state());
    }

    #[test]
    fn donation_router_creates_combined_router() {
        let router = donation_router();
        let _: Router<()> = router.with_state(test_state());
    }
}
