//! Khalti gateway adapter.
//!
//! Initiates e-payment sessions and verifies outcomes through the lookup
//! API. The donation's stored reference is `khalti:<pidx>`, so the verify
//! endpoint can find it by exact reference equality.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::KhaltiCredentials;
use crate::domain::donation::{reference, PaymentMode, Provider};
use crate::ports::{
    GatewayError, InitiateRequest, InitiatedPayment, KhaltiLookup, KhaltiLookupResult,
    PaymentGateway,
};

/// Khalti gateway configuration.
#[derive(Clone)]
pub struct KhaltiGatewayConfig {
    /// Merchant credentials; absent in mock-only deployments.
    pub credentials: Option<KhaltiCredentials>,

    /// Global mock/live mode.
    pub mode: PaymentMode,

    /// Donor-facing page Khalti redirects back to (that page calls the
    /// verify endpoint with the echoed `pidx`).
    pub return_url: String,

    /// Public website URL, required by the initiate API.
    pub website_url: String,
}

/// Khalti gateway adapter.
pub struct KhaltiGateway {
    config: KhaltiGatewayConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct InitiatePayload<'a> {
    return_url: &'a str,
    website_url: &'a str,
    /// Amount in paisa.
    amount: i64,
    purchase_order_id: String,
    purchase_order_name: &'a str,
    customer_info: CustomerInfo<'a>,
}

#[derive(Debug, Serialize)]
struct CustomerInfo<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitiateResponse {
    pidx: String,
    payment_url: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: String,
    total_amount: i64,
}

impl KhaltiGateway {
    pub fn new(config: KhaltiGatewayConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn credentials(&self) -> Result<&KhaltiCredentials, GatewayError> {
        self.config
            .credentials
            .as_ref()
            .ok_or_else(|| GatewayError::authentication("Khalti credentials not configured"))
    }

    fn mock_initiate(&self, request: &InitiateRequest) -> InitiatedPayment {
        let pidx = format!("mock{}", request.donation_id.short_prefix(8));
        InitiatedPayment {
            redirect_url: format!("{}?pidx={}", self.config.return_url, pidx),
            reference: reference::khalti_reference(&pidx),
        }
    }
}

#[async_trait]
impl PaymentGateway for KhaltiGateway {
    fn provider(&self) -> Provider {
        Provider::Khalti
    }

    async fn initiate(
        &self,
        request: InitiateRequest,
    ) -> Result<InitiatedPayment, GatewayError> {
        if self.config.mode.is_mock() {
            return Ok(self.mock_initiate(&request));
        }

        let credentials = self.credentials()?;
        let url = format!("{}/epayment/initiate/", credentials.base_url);

        let payload = InitiatePayload {
            return_url: &self.config.return_url,
            website_url: &self.config.website_url,
            amount: request.amount.minor_units(),
            purchase_order_id: request.donation_id.to_string(),
            purchase_order_name: "Donation to Sahayog Foundation",
            customer_info: CustomerInfo {
                name: &request.donor_name,
                email: &request.donor_email,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Key {}", credentials.secret_key.expose_secret()),
            )
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(error = %error_text, "Khalti initiate failed");
            return Err(GatewayError::provider(format!(
                "Khalti API error: {}",
                error_text
            )));
        }

        let initiated: InitiateResponse = response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!("Failed to parse Khalti response: {}", e))
        })?;

        tracing::info!(
            donation_id = %request.donation_id,
            pidx = %reference::masked(&initiated.pidx),
            "Khalti e-payment initiated"
        );

        Ok(InitiatedPayment {
            redirect_url: initiated.payment_url,
            reference: reference::khalti_reference(&initiated.pidx),
        })
    }
}

#[async_trait]
impl KhaltiLookup for KhaltiGateway {
    async fn lookup(&self, pidx: &str) -> Result<KhaltiLookupResult, GatewayError> {
        // Mock mode is deterministic: every payment looks up as completed.
        if self.config.mode.is_mock() {
            return Ok(KhaltiLookupResult {
                status: "Completed".to_string(),
                total_amount_paisa: 0,
            });
        }

        let credentials = self.credentials()?;
        let url = format!("{}/epayment/lookup/", credentials.base_url);

        let response = self
            .http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Key {}", credentials.secret_key.expose_secret()),
            )
            .json(&serde_json::json!({ "pidx": pidx }))
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                pidx = %reference::masked(pidx),
                error = %error_text,
                "Khalti lookup failed"
            );
            return Err(GatewayError::provider(format!(
                "Khalti lookup error: {}",
                error_text
            )));
        }

        let lookup: LookupResponse = response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!("Failed to parse Khalti lookup: {}", e))
        })?;

        Ok(KhaltiLookupResult {
            status: lookup.status,
            total_amount_paisa: lookup.total_amount,
        })
    }
}
