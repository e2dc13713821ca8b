//! Donation-specific error types.
//!
//! Errors raised by the donation pipeline: donor input validation, provider
//! availability, payment initiation, and callback verification.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation | 400 |
//! | ProviderUnavailable | 400 |
//! | PaymentInitiationFailed | 502 |
//! | VerificationFailed | 502 |
//! | NotFound | 404 |
//! | AlreadyTerminal | 409 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, DonationId};

use super::provider::Provider;
use super::status::DonationStatus;

/// Errors raised by donation operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DonationError {
    /// Donor-supplied input failed validation.
    Validation { field: String, reason: String },

    /// The requested provider is not in the enabled set.
    ProviderUnavailable(Provider),

    /// The provider adapter could not produce a redirect.
    PaymentInitiationFailed { reason: String },

    /// The server-to-server verification call errored or returned an
    /// unexpected shape.
    VerificationFailed { reason: String },

    /// No donation matched the callback's lookup key.
    NotFound { lookup: String },

    /// The donation is already in a terminal state.
    AlreadyTerminal {
        id: DonationId,
        status: DonationStatus,
    },

    /// Underlying infrastructure failure.
    Infrastructure(String),
}

impl DonationError {
    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DonationError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a provider-unavailable error.
    pub fn provider_unavailable(provider: Provider) -> Self {
        DonationError::ProviderUnavailable(provider)
    }

    /// Creates an initiation-failed error.
    pub fn initiation_failed(reason: impl Into<String>) -> Self {
        DonationError::PaymentInitiationFailed {
            reason: reason.into(),
        }
    }

    /// Creates a verification-failed error.
    pub fn verification_failed(reason: impl Into<String>) -> Self {
        DonationError::VerificationFailed {
            reason: reason.into(),
        }
    }

    /// Creates a not-found error for a (masked) lookup key.
    pub fn not_found(lookup: impl Into<String>) -> Self {
        DonationError::NotFound {
            lookup: lookup.into(),
        }
    }

    /// Creates an already-terminal error.
    pub fn already_terminal(id: DonationId, status: DonationStatus) -> Self {
        DonationError::AlreadyTerminal { id, status }
    }

    /// Creates an infrastructure error.
    pub fn infrastructure(reason: impl Into<String>) -> Self {
        DonationError::Infrastructure(reason.into())
    }

    /// Human-readable message, safe to surface to callers.
    pub fn message(&self) -> String {
        match self {
            DonationError::Validation { field, reason } => {
                format!("Invalid {}: {}", field, reason)
            }
            DonationError::ProviderUnavailable(provider) => {
                format!("Payment method '{}' is not available", provider)
            }
            DonationError::PaymentInitiationFailed { .. } => {
                "Could not start the payment. Please try another method.".to_string()
            }
            DonationError::VerificationFailed { reason } => {
                format!("Payment verification failed: {}", reason)
            }
            DonationError::NotFound { lookup } => {
                format!("No donation found for {}", lookup)
            }
            DonationError::AlreadyTerminal { status, .. } => {
                format!("Donation is already {}", status)
            }
            DonationError::Infrastructure(_) => "Internal error".to_string(),
        }
    }
}

impl std::fmt::Display for DonationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for DonationError {}

impl From<DomainError> for DonationError {
    fn from(err: DomainError) -> Self {
        DonationError::Infrastructure(err.to_string())
    }
}
