//! Stripe gateway adapter.
//!
//! Initiates hosted checkout sessions and verifies webhook deliveries.
//! The checkout session carries the donation id as `client_reference_id`,
//! so the webhook reconciler can locate the donation without a secondary
//! lookup table.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::StripeCredentials;
use crate::domain::donation::{reference, PaymentMode, Provider};
use crate::ports::{
    GatewayError, InitiateRequest, InitiatedPayment, PaymentGateway, StripeEvent,
    StripeEventSource,
};

use super::events::{parse_event, SignatureHeader};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Stripe gateway configuration.
#[derive(Clone)]
pub struct StripeGatewayConfig {
    /// API credentials; absent in mock-only deployments.
    pub credentials: Option<StripeCredentials>,

    /// Global mock/live mode.
    pub mode: PaymentMode,

    /// Base URL for the Stripe API.
    pub api_base_url: String,

    /// Donor-facing page after successful checkout.
    pub success_url: String,

    /// Donor-facing page after cancelled checkout.
    pub cancel_url: String,
}

impl StripeGatewayConfig {
    pub fn new(
        credentials: Option<StripeCredentials>,
        mode: PaymentMode,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            mode,
            api_base_url: "https://api.stripe.com".to_string(),
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe gateway adapter.
pub struct StripeGateway {
    config: StripeGatewayConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    id: String,
    url: Option<String>,
}

impl StripeGateway {
    pub fn new(config: StripeGatewayConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn credentials(&self) -> Result<&StripeCredentials, GatewayError> {
        self.config
            .credentials
            .as_ref()
            .ok_or_else(|| GatewayError::authentication("Stripe credentials not configured"))
    }

    /// Verify a webhook signature using HMAC-SHA256.
    fn verify_signature(
        &self,
        payload: &[u8],
        header: &SignatureHeader,
    ) -> Result<(), GatewayError> {
        let credentials = self.credentials()?;

        // 1. Validate timestamp (prevent replay attacks)
        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                age_secs = age,
                "Webhook event too old - possible replay"
            );
            return Err(GatewayError::invalid_signature(format!(
                "Event too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                "Webhook event timestamp in the future"
            );
            return Err(GatewayError::invalid_signature("Event timestamp in future"));
        }

        // 2. Compute expected signature
        let signed_payload = format!(
            "{}.{}",
            header.timestamp,
            String::from_utf8_lossy(payload)
        );

        let mut mac = HmacSha256::new_from_slice(
            credentials.webhook_secret.expose_secret().as_bytes(),
        )
        .expect("HMAC can take key of any size");
        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();

        // 3. Constant-time comparison
        let expected_bytes: &[u8] = expected.as_slice();
        if expected_bytes.ct_eq(&header.v1_signature).unwrap_u8() != 1 {
            tracing::warn!("Invalid Stripe webhook signature");
            return Err(GatewayError::invalid_signature("Invalid signature"));
        }

        Ok(())
    }

    fn mock_initiate(&self, request: &InitiateRequest) -> InitiatedPayment {
        let session_id = format!("cs_mock_{}", request.donation_id.short_prefix(8));
        InitiatedPayment {
            redirect_url: format!(
                "{}?donation={}",
                self.config.success_url, request.donation_id
            ),
            reference: reference::payment_reference(Provider::Stripe, &session_id),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn provider(&self) -> Provider {
        Provider::Stripe
    }

    async fn initiate(
        &self,
        request: InitiateRequest,
    ) -> Result<InitiatedPayment, GatewayError> {
        if self.config.mode.is_mock() {
            return Ok(self.mock_initiate(&request));
        }

        let credentials = self.credentials()?;
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let donation_id = request.donation_id.to_string();
        let unit_amount = request.amount.minor_units().to_string();
        let currency = request.currency.as_str().to_ascii_lowercase();
        let product_name = if request.is_monthly {
            "Monthly donation to Sahayog Foundation"
        } else {
            "Donation to Sahayog Foundation"
        };

        let mut params = vec![
            ("client_reference_id", donation_id.clone()),
            ("customer_email", request.donor_email.clone()),
            ("line_items[0][price_data][currency]", currency),
            ("line_items[0][price_data][unit_amount]", unit_amount),
            (
                "line_items[0][price_data][product_data][name]",
                product_name.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", self.config.success_url.clone()),
            ("cancel_url", self.config.cancel_url.clone()),
            ("metadata[donation_id]", donation_id),
        ];

        if request.is_monthly {
            params.push(("mode", "subscription".to_string()));
            params.push((
                "line_items[0][price_data][recurring][interval]",
                "month".to_string(),
            ));
        } else {
            params.push(("mode", "payment".to_string()));
        }

        let response = self
            .http_client
            .post(&url)
            .basic_auth(
                credentials.secret_key.expose_secret(),
                Option::<&str>::None,
            )
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(error = %error_text, "Stripe checkout session creation failed");
            return Err(GatewayError::provider(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let session: CheckoutSessionResponse = response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!("Failed to parse Stripe response: {}", e))
        })?;

        let redirect_url = session.url.ok_or_else(|| {
            GatewayError::invalid_response("Checkout session has no redirect URL")
        })?;

        tracing::info!(
            donation_id = %request.donation_id,
            session = %reference::masked(&session.id),
            "Stripe checkout session created"
        );

        Ok(InitiatedPayment {
            redirect_url,
            reference: reference::payment_reference(Provider::Stripe, &session.id),
        })
    }
}

impl StripeEventSource for StripeGateway {
    fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<StripeEvent, GatewayError> {
        // Mock mode trusts the raw body; acceptable only because mock mode
        // is never a production configuration.
        if self.config.mode.is_mock() {
            return parse_event(payload);
        }

        let signature = signature.ok_or_else(|| {
            GatewayError::invalid_signature("Missing Stripe-Signature header")
        })?;
        let header = SignatureHeader::parse(signature)?;
        self.verify_signature(payload, &header)?;

        let event = parse_event(payload)?;

        tracing::info!(
            event_id = %event.id,
            "Stripe webhook signature verified"
        );

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::donation::{Amount, Currency};
    use crate::domain::foundation::DonationId;
    use crate::ports::StripeEventKind;
    use rust_decimal::Decimal;
    use secrecy::SecretString;

    const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret_12345";

    fn test_credentials() -> StripeCredentials {
        StripeCredentials {
            secret_key: SecretString::new("sk_test_key".into()),
            webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
        }
    }

    fn live_gateway() -> StripeGateway {
        StripeGateway::new(StripeGatewayConfig::new(
            Some(test_credentials()),
            PaymentMode::Live,
            "https://sahayog.org/donate/success",
            "https://sahayog.org/donate/cancelled",
        ))
    }

    fn mock_gateway() -> StripeGateway {
        StripeGateway::new(StripeGatewayConfig::new(
            None,
            PaymentMode::Mock,
            "https://sahayog.org/donate/success",
            "https://sahayog.org/donate/cancelled",
        ))
    }

    fn signed_header(secret: &str, timestamp: i64, payload: &str) -> String {
        let signed_payload = format!("{}.{}", timestamp, payload);
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed_payload.as_bytes());
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    fn test_request() -> InitiateRequest {
        InitiateRequest {
            donation_id: DonationId::new(),
            amount: Amount::new(Decimal::new(2500, 2)).unwrap(),
            currency: Currency::Usd,
            donor_name: "Asha Tamang".to_string(),
            donor_email: "asha@example.org".to_string(),
            is_monthly: false,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Mode Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn mock_initiate_is_deterministic_and_offline() {
        let gateway = mock_gateway();
        let request = test_request();
        let id = request.donation_id;

        let payment = gateway.initiate(request).await.unwrap();

        assert!(payment.redirect_url.contains(&id.to_string()));
        assert!(payment
            .reference
            .starts_with(&format!("stripe:cs_mock_{}", id.short_prefix(8))));
    }

    #[test]
    fn mock_mode_parses_unsigned_payload() {
        let gateway = mock_gateway();
        let payload = r#"{
            "id": "evt_mock",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_mock_1"}}
        }"#;

        let event = gateway.verify_and_parse(payload.as_bytes(), None).unwrap();
        assert_eq!(event.id, "evt_mock");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let gateway = live_gateway();
        let payload = r#"{
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_1"}}
        }"#;
        let timestamp = chrono::Utc::now().timestamp();
        let header = signed_header(TEST_WEBHOOK_SECRET, timestamp, payload);

        let event = gateway
            .verify_and_parse(payload.as_bytes(), Some(&header))
            .unwrap();
        assert!(matches!(event.kind, StripeEventKind::CheckoutCompleted { .. }));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let gateway = live_gateway();
        let payload = r#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_1"}}}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let header = signed_header("whsec_other", timestamp, payload);

        let result = gateway.verify_and_parse(payload.as_bytes(), Some(&header));
        assert!(result.is_err());
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let gateway = live_gateway();
        let original = r#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_1"}}}"#;
        let tampered = r#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_2"}}}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let header = signed_header(TEST_WEBHOOK_SECRET, timestamp, original);

        let result = gateway.verify_and_parse(tampered.as_bytes(), Some(&header));
        assert!(result.is_err());
    }

    #[test]
    fn verify_rejects_expired_timestamp() {
        let gateway = live_gateway();
        let payload = r#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_1"}}}"#;
        let old_timestamp = chrono::Utc::now().timestamp() - 600;
        let header = signed_header(TEST_WEBHOOK_SECRET, old_timestamp, payload);

        let err = gateway
            .verify_and_parse(payload.as_bytes(), Some(&header))
            .unwrap_err();
        assert!(err.message.contains("too old"));
    }

    #[test]
    fn verify_rejects_future_timestamp() {
        let gateway = live_gateway();
        let payload = r#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_1"}}}"#;
        let future_timestamp = chrono::Utc::now().timestamp() + 120;
        let header = signed_header(TEST_WEBHOOK_SECRET, future_timestamp, payload);

        let err = gateway
            .verify_and_parse(payload.as_bytes(), Some(&header))
            .unwrap_err();
        assert!(err.message.contains("future"));
    }

    #[test]
    fn verify_tolerates_small_clock_skew() {
        let gateway = live_gateway();
        let payload = r#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_1"}}}"#;
        let timestamp = chrono::Utc::now().timestamp() + 30;
        let header = signed_header(TEST_WEBHOOK_SECRET, timestamp, payload);

        assert!(gateway
            .verify_and_parse(payload.as_bytes(), Some(&header))
            .is_ok());
    }

    #[test]
    fn verify_requires_signature_header_in_live_mode() {
        let gateway = live_gateway();
        let payload = r#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_1"}}}"#;

        let err = gateway.verify_and_parse(payload.as_bytes(), None).unwrap_err();
        assert!(err.message.contains("Missing Stripe-Signature"));
    }
}
