//! HTTP DTOs (Data Transfer Objects) for donation endpoints.
//!
//! These types define the JSON request/response structure for the donation
//! API. They serve as the boundary between HTTP and the application layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::donation::{
    Currency, Donation, DonationStatus, PaymentSettings, Provider, ResolvedPaymentConfig,
};
use crate::ports::DonationSummary;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a donation.
#[derive(Debug, Clone, Deserialize)]
pub struct StartDonationRequest {
    /// Amount in major currency units.
    pub amount: Decimal,
    /// Donor's full name.
    pub donor_name: String,
    /// Donor's email address.
    pub donor_email: String,
    /// Donor's phone number (optional).
    #[serde(default)]
    pub donor_phone: Option<String>,
    /// One-time vs monthly recurrence.
    #[serde(default)]
    pub is_monthly: bool,
    /// Which gateway to pay through.
    pub provider: Provider,
}

/// Request body for the Khalti verify endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct KhaltiVerifyRequest {
    /// Payment index echoed by Khalti's return redirect.
    pub pidx: String,
}

/// Request to replace the payment settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentSettingsRequest {
    pub enabled_providers: Vec<Provider>,
    pub primary_provider: Provider,
    pub default_currency: Currency,
    pub allow_recurring: bool,
}

/// Pagination parameters for the admin listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListDonationsParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for a successfully started donation.
#[derive(Debug, Clone, Serialize)]
pub struct StartDonationResponse {
    pub ok: bool,
    /// The new donation's id.
    pub donation_id: String,
    /// URL to forward the donor's browser to.
    pub redirect_url: String,
}

/// Donor-facing donation view.
#[derive(Debug, Clone, Serialize)]
pub struct DonationResponse {
    pub id: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: DonationStatus,
    pub is_monthly: bool,
    pub receipt_number: Option<String>,
    /// When the donation was created (ISO 8601).
    pub created_at: String,
}

impl From<Donation> for DonationResponse {
    fn from(donation: Donation) -> Self {
        Self {
            id: donation.id.to_string(),
            amount: donation.amount.value(),
            currency: donation.currency,
            status: donation.status,
            is_monthly: donation.is_monthly,
            receipt_number: donation.receipt.map(|r| r.number),
            created_at: donation.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Response describing the currently payable options.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOptionsResponse {
    /// Providers that can actually process a payment right now.
    pub providers: Vec<Provider>,
    /// Provider to show first, if any are available.
    pub primary: Option<Provider>,
    pub default_currency: Currency,
    pub allow_recurring: bool,
}

impl From<ResolvedPaymentConfig> for PaymentOptionsResponse {
    fn from(resolved: ResolvedPaymentConfig) -> Self {
        Self {
            providers: resolved.enabled,
            primary: resolved.primary,
            default_currency: resolved.default_currency,
            allow_recurring: resolved.allow_recurring,
        }
    }
}

/// Acknowledgment for webhook deliveries.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
}

/// Result of a verify-style reconciliation (Khalti).
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileResponse {
    pub ok: bool,
    /// `completed`, `failed`, `already_processed`, or `not_found`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donation_id: Option<String>,
}

/// Admin listing row.
#[derive(Debug, Clone, Serialize)]
pub struct DonationSummaryResponse {
    pub id: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub donor_name: String,
    pub donor_email: String,
    pub is_monthly: bool,
    pub status: DonationStatus,
    pub payment_reference: Option<String>,
    pub receipt_number: Option<String>,
    pub created_at: String,
}

impl From<DonationSummary> for DonationSummaryResponse {
    fn from(summary: DonationSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            amount: summary.amount,
            currency: summary.currency,
            donor_name: summary.donor_name,
            donor_email: summary.donor_email,
            is_monthly: summary.is_monthly,
            status: summary.status,
            payment_reference: summary.payment_reference,
            receipt_number: summary.receipt_number,
            created_at: summary.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Admin listing response.
#[derive(Debug, Clone, Serialize)]
pub struct DonationListResponse {
    pub donations: Vec<DonationSummaryResponse>,
    pub total: i64,
}

/// Payment settings view.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSettingsResponse {
    pub enabled_providers: Vec<Provider>,
    pub primary_provider: Provider,
    pub default_currency: Currency,
    pub allow_recurring: bool,
    pub updated_at: String,
}

impl From<PaymentSettings> for PaymentSettingsResponse {
    fn from(settings: PaymentSettings) -> Self {
        Self {
            enabled_providers: settings.enabled_providers,
            primary_provider: settings.primary_provider,
            default_currency: settings.default_currency,
            allow_recurring: settings.allow_recurring,
            updated_at: settings.updated_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
