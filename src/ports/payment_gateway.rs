//! Payment gateway ports.
//!
//! Every gateway implements the same initiation contract and is selected
//! through [`GatewayRegistry`], so the orchestrator never branches on a
//! provider name. Verification is asymmetric by nature (Stripe's signed
//! webhook is its own proof; Khalti and eSewa need a server-to-server
//! call), so each verification style gets its own narrow port.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::donation::{Amount, Currency, Provider};
use crate::domain::foundation::DonationId;

// ════════════════════════════════════════════════════════════════════════════════
// Initiation
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a payment for a pending donation.
#[derive(Debug, Clone)]
pub struct InitiateRequest {
    pub donation_id: DonationId,
    pub amount: Amount,
    pub currency: Currency,
    pub donor_name: String,
    pub donor_email: String,
    pub is_monthly: bool,
}

/// Result of a successful initiation.
#[derive(Debug, Clone)]
pub struct InitiatedPayment {
    /// URL the donor's browser is forwarded to.
    pub redirect_url: String,

    /// Storage form of the transaction reference
    /// (`stripe:<session>`, `khalti:<pidx>`, or the composite
    /// `esewa_<donation id>`).
    pub reference: String,
}

/// Port for payment initiation.
///
/// Implementations must not write to the donation ledger; the orchestrator
/// persists the returned reference.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// The provider this gateway fronts.
    fn provider(&self) -> Provider;

    /// Obtains a redirect URL and transaction reference for the donation.
    async fn initiate(&self, request: InitiateRequest)
        -> Result<InitiatedPayment, GatewayError>;
}

/// Map-based gateway dispatch.
///
/// Adding a gateway means registering it here; the orchestrator and
/// reconcilers are untouched.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<Provider, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a gateway under its own provider key.
    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.provider(), gateway);
    }

    /// Looks up the gateway for a provider.
    pub fn get(&self, provider: Provider) -> Option<Arc<dyn PaymentGateway>> {
        self.gateways.get(&provider).cloned()
    }

    /// Providers with a registered gateway.
    pub fn providers(&self) -> Vec<Provider> {
        self.gateways.keys().copied().collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Verification
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe webhook event, parsed into the shapes the reconciler handles.
///
/// Unrecognized event types or malformed objects are rejected by the parser
/// as [`GatewayErrorKind::UnrecognizedEvent`] rather than carried as
/// untyped JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripeEvent {
    /// Provider event id (`evt_...`), used for logging.
    pub id: String,
    pub kind: StripeEventKind,
}

/// The Stripe event types the reconciler acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripeEventKind {
    /// `checkout.session.completed` — the donation succeeded.
    CheckoutCompleted {
        session_id: String,
        /// Donation id carried in `client_reference_id`.
        client_reference_id: Option<String>,
        amount_total_minor: Option<i64>,
        currency: Option<String>,
    },
    /// `checkout.session.expired` — the donor abandoned checkout.
    CheckoutExpired {
        session_id: String,
        client_reference_id: Option<String>,
    },
    /// `payment_intent.payment_failed`.
    PaymentFailed { payment_intent_id: String },
}

/// Port for verifying and parsing a Stripe webhook delivery.
///
/// In live mode the signature header is required and checked; in mock mode
/// the raw body is parsed as trusted JSON.
pub trait StripeEventSource: Send + Sync {
    fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<StripeEvent, GatewayError>;
}

/// Result of a Khalti lookup call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KhaltiLookupResult {
    /// Provider-reported status string; `"Completed"` means paid.
    pub status: String,

    /// Amount in paisa as reported by Khalti.
    pub total_amount_paisa: i64,
}

/// Port for the Khalti server-to-server lookup.
#[async_trait]
pub trait KhaltiLookup: Send + Sync {
    async fn lookup(&self, pidx: &str) -> Result<KhaltiLookupResult, GatewayError>;
}

/// Port for the eSewa transaction verification call.
#[async_trait]
pub trait EsewaVerification: Send + Sync {
    /// Confirms a transaction with the `transrec` endpoint.
    ///
    /// Returns `true` when the gateway reports success. The underlying
    /// contract is a plain-text body scanned for a success marker; the
    /// gateway offers nothing stricter.
    async fn verify_transaction(
        &self,
        reference_id: &str,
        amount: &str,
        product_id: &str,
    ) -> Result<bool, GatewayError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Errors from gateway operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
    pub retryable: bool,
}

/// Gateway error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Network connectivity issue.
    Network,
    /// Credential rejected by the provider.
    Authentication,
    /// Provider API returned an error.
    Provider,
    /// Provider response could not be parsed.
    InvalidResponse,
    /// Webhook signature verification failed.
    InvalidSignature,
    /// Webhook event type or shape is not one we handle.
    UnrecognizedEvent,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        let retryable = matches!(kind, GatewayErrorKind::Network);
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Network, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Authentication, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Provider, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::InvalidResponse, message)
    }

    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::InvalidSignature, message)
    }

    pub fn unrecognized_event(event_type: impl Into<String>) -> Self {
        Self::new(
            GatewayErrorKind::UnrecognizedEvent,
            format!("Unhandled event type: {}", event_type.into()),
        )
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for GatewayError {}
