//! Ports: the contracts between the application core and its adapters.

mod donation_reader;
mod donation_repository;
mod payment_gateway;
mod settings_repository;

pub use donation_reader::{DonationReader, DonationSummary};
pub use donation_repository::{DonationRepository, TransitionOutcome};
pub use payment_gateway::{
    EsewaVerification, GatewayError, GatewayErrorKind, GatewayRegistry, InitiateRequest,
    InitiatedPayment, KhaltiLookup, KhaltiLookupResult, PaymentGateway, StripeEvent,
    StripeEventKind, StripeEventSource,
};
pub use settings_repository::PaymentSettingsRepository;
