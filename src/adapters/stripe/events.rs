//! Stripe webhook payload parsing.
//!
//! The `Stripe-Signature` header and the raw event JSON are parsed here;
//! signature verification lives in the gateway. Events are mapped into the
//! tagged [`StripeEvent`] union — any event type or object shape we do not
//! handle is rejected with a distinct error kind instead of being carried
//! around as untyped JSON.

use serde::Deserialize;

use crate::ports::{GatewayError, StripeEvent, StripeEventKind};

/// Parsed components of the `Stripe-Signature` header.
///
/// Format: `t=<timestamp>,v1=<signature>[,v0=<legacy>]`. Unknown fields are
/// ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// v1 signature (HMAC-SHA256).
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses a `Stripe-Signature` header string.
    pub fn parse(header: &str) -> Result<Self, GatewayError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                GatewayError::invalid_signature("Invalid Stripe-Signature header format")
            })?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        GatewayError::invalid_signature("Invalid signature timestamp")
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex::decode(value).map_err(|_| {
                        GatewayError::invalid_signature("Invalid v1 signature hex")
                    })?);
                }
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| GatewayError::invalid_signature("Missing signature timestamp"))?;
        let v1_signature =
            v1_signature.ok_or_else(|| GatewayError::invalid_signature("Missing v1 signature"))?;

        Ok(SignatureHeader {
            timestamp,
            v1_signature,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    id: String,
    client_reference_id: Option<String>,
    amount_total: Option<i64>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPaymentIntent {
    id: String,
}

/// Parses a Stripe event payload into the tagged union.
///
/// Callers must verify the signature first (live mode) — this function
/// trusts its input.
pub fn parse_event(payload: &[u8]) -> Result<StripeEvent, GatewayError> {
    let raw: RawEvent = serde_json::from_slice(payload)
        .map_err(|e| GatewayError::invalid_response(format!("Invalid event JSON: {}", e)))?;

    let kind = match raw.event_type.as_str() {
        "checkout.session.completed" => {
            let session: RawCheckoutSession = serde_json::from_value(raw.data.object)
                .map_err(|e| {
                    GatewayError::invalid_response(format!("Invalid checkout session: {}", e))
                })?;
            StripeEventKind::CheckoutCompleted {
                session_id: session.id,
                client_reference_id: session.client_reference_id,
                amount_total_minor: session.amount_total,
                currency: session.currency,
            }
        }
        "checkout.session.expired" => {
            let session: RawCheckoutSession = serde_json::from_value(raw.data.object)
                .map_err(|e| {
                    GatewayError::invalid_response(format!("Invalid checkout session: {}", e))
                })?;
            StripeEventKind::CheckoutExpired {
                session_id: session.id,
                client_reference_id: session.client_reference_id,
            }
        }
        "payment_intent.payment_failed" => {
            let intent: RawPaymentIntent = serde_json::from_value(raw.data.object)
                .map_err(|e| {
                    GatewayError::invalid_response(format!("Invalid payment intent: {}", e))
                })?;
            StripeEventKind::PaymentFailed {
                payment_intent_id: intent.id,
            }
        }
        other => return Err(GatewayError::unrecognized_event(other)),
    };

    Ok(StripeEvent { id: raw.id, kind })
}
