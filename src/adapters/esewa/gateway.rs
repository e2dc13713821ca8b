//! eSewa gateway adapter.
//!
//! eSewa takes a signed form post rather than a server-created session: the
//! adapter signs an ordered field list with HMAC-SHA256 and hands the donor
//! a gateway URL carrying those fields. The gateway echoes our transaction
//! UUID (not an opaque token), so the UUID embeds a timestamp and a short
//! donation-id prefix that the callbacks can recover.
//!
//! Verification is a `transrec` GET whose plain-text response contains the
//! word "success" on confirmed transactions. The contract is that loose on
//! the gateway side; nothing stricter is available without a gateway
//! change.

use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::Sha256;

use crate::config::EsewaCredentials;
use crate::domain::donation::{reference, PaymentMode, Provider};
use crate::ports::{
    EsewaVerification, GatewayError, InitiateRequest, InitiatedPayment, PaymentGateway,
};

type HmacSha256 = Hmac<Sha256>;

/// eSewa gateway configuration.
#[derive(Clone)]
pub struct EsewaGatewayConfig {
    /// Merchant credentials; absent in mock-only deployments.
    pub credentials: Option<EsewaCredentials>,

    /// Global mock/live mode.
    pub mode: PaymentMode,

    /// Our success callback endpoint (eSewa redirects here with
    /// `refId`/`oid`/`amt`).
    pub success_callback_url: String,

    /// Our failure callback endpoint (eSewa redirects here with a base64
    /// `data` blob).
    pub failure_callback_url: String,
}

/// eSewa gateway adapter.
pub struct EsewaGateway {
    config: EsewaGatewayConfig,
    http_client: reqwest::Client,
}

impl EsewaGateway {
    pub fn new(config: EsewaGatewayConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn credentials(&self) -> Result<&EsewaCredentials, GatewayError> {
        self.config
            .credentials
            .as_ref()
            .ok_or_else(|| GatewayError::authentication("eSewa credentials not configured"))
    }

    /// Signs the ordered, comma-joined field list with the shared secret.
    ///
    /// The field order is fixed by the gateway:
    /// `total_amount=X,transaction_uuid=Y,product_code=Z`.
    fn sign(secret: &str, total_amount: &str, transaction_uuid: &str, product_code: &str) -> String {
        let message = format!(
            "total_amount={},transaction_uuid={},product_code={}",
            total_amount, transaction_uuid, product_code
        );
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(message.as_bytes());
        base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
    }

    fn mock_initiate(&self, request: &InitiateRequest) -> InitiatedPayment {
        let donation_reference = reference::esewa_reference(&request.donation_id);
        // Straight to our own success callback with synthetic valid params.
        let redirect_url = format!(
            "{}?oid={}&amt={}&refId=MOCK{}",
            self.config.success_callback_url,
            donation_reference,
            request.amount.value().normalize(),
            request.donation_id.short_prefix(8).to_uppercase()
        );
        InitiatedPayment {
            redirect_url,
            reference: donation_reference,
        }
    }
}

#[async_trait]
impl PaymentGateway for EsewaGateway {
    fn provider(&self) -> Provider {
        Provider::Esewa
    }

    async fn initiate(
        &self,
        request: InitiateRequest,
    ) -> Result<InitiatedPayment, GatewayError> {
        if self.config.mode.is_mock() {
            return Ok(self.mock_initiate(&request));
        }

        let credentials = self.credentials()?;

        let total_amount = request.amount.value().normalize().to_string();
        let transaction_uuid = reference::esewa_transaction_uuid(
            chrono::Utc::now().timestamp(),
            &request.donation_id,
        );
        let signature = Self::sign(
            credentials.secret_key.expose_secret(),
            &total_amount,
            &transaction_uuid,
            &credentials.merchant_id,
        );

        let form_url = reqwest::Url::parse_with_params(
            &format!("{}/epay/main/v2/form", credentials.base_url),
            [
                ("amount", total_amount.as_str()),
                ("tax_amount", "0"),
                ("product_service_charge", "0"),
                ("product_delivery_charge", "0"),
                ("total_amount", total_amount.as_str()),
                ("transaction_uuid", transaction_uuid.as_str()),
                ("product_code", credentials.merchant_id.as_str()),
                ("success_url", self.config.success_callback_url.as_str()),
                ("failure_url", self.config.failure_callback_url.as_str()),
                (
                    "signed_field_names",
                    "total_amount,transaction_uuid,product_code",
                ),
                ("signature", signature.as_str()),
            ],
        )
        .map_err(|e| {
            GatewayError::invalid_response(format!("Invalid eSewa form URL: {}", e))
        })?;

        tracing::info!(
            donation_id = %request.donation_id,
            transaction_uuid = %reference::masked(&transaction_uuid),
            "eSewa form payload signed"
        );

        Ok(InitiatedPayment {
            redirect_url: form_url.to_string(),
            reference: reference::esewa_reference(&request.donation_id),
        })
    }
}

#[async_trait]
impl EsewaVerification for EsewaGateway {
    async fn verify_transaction(
        &self,
        reference_id: &str,
        amount: &str,
        product_id: &str,
    ) -> Result<bool, GatewayError> {
        // Mock mode is deterministic: every transaction verifies.
        if self.config.mode.is_mock() {
            return Ok(true);
        }

        let credentials = self.credentials()?;
        let url = reqwest::Url::parse_with_params(
            &format!("{}/epay/transrec", credentials.base_url),
            [
                ("amt", amount),
                ("scd", credentials.merchant_id.as_str()),
                ("rid", reference_id),
                ("pid", product_id),
            ],
        )
        .map_err(|e| {
            GatewayError::invalid_response(format!("Invalid transrec URL: {}", e))
        })?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(
                rid = %reference::masked(reference_id),
                %status,
                "eSewa transrec request failed"
            );
            return Err(GatewayError::provider(format!(
                "eSewa transrec error: HTTP {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::invalid_response(e.to_string()))?;

        // The endpoint returns a small XML/plain-text body; a "success"
        // marker anywhere in it means the transaction is confirmed.
        Ok(body.to_ascii_lowercase().contains("success"))
    }
}
