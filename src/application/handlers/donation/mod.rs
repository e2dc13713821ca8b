//! Donation use-case handlers.
//!
//! One command/query handler per file. The four reconcilers share the
//! [`ReconcileOutcome`] vocabulary so the HTTP layer can map every callback
//! to the right redirect or acknowledgment.

mod get_donation;
mod get_payment_options;
mod list_donations;
mod reconcile_esewa_failure;
mod reconcile_esewa_success;
mod reconcile_stripe_webhook;
mod start_donation;
mod update_payment_settings;
mod verify_khalti_payment;

#[cfg(test)]
pub(crate) mod testing;

pub use get_donation::{GetDonationHandler, GetDonationQuery};
pub use get_payment_options::{GetPaymentOptionsHandler, GetPaymentOptionsQuery};
pub use list_donations::{ListDonationsHandler, ListDonationsQuery, ListDonationsResult};
pub use reconcile_esewa_failure::{ReconcileEsewaFailureCommand, ReconcileEsewaFailureHandler};
pub use reconcile_esewa_success::{ReconcileEsewaSuccessCommand, ReconcileEsewaSuccessHandler};
pub use reconcile_stripe_webhook::{HandleStripeWebhookCommand, HandleStripeWebhookHandler};
pub use start_donation::{StartDonationCommand, StartDonationHandler, StartDonationResult};
pub use update_payment_settings::{
    UpdatePaymentSettingsCommand, UpdatePaymentSettingsHandler,
};
pub use verify_khalti_payment::{VerifyKhaltiPaymentCommand, VerifyKhaltiPaymentHandler};

use crate::domain::foundation::DonationId;

/// What a reconciler did with an inbound notification.
///
/// Every variant is a successful handling from the caller's point of view;
/// external gateways retry on errors, so only genuine verification or
/// infrastructure failures surface as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The donation was transitioned to `completed`.
    Completed(DonationId),

    /// The donation was transitioned to `failed`.
    Failed(DonationId),

    /// The donation was already terminal; nothing changed.
    AlreadyTerminal(DonationId),

    /// No donation matched the notification. Logged and acknowledged.
    NotFound,

    /// The notification is not one we act on (e.g. an unhandled Stripe
    /// event type). Acknowledged so the sender stops retrying.
    Ignored(String),
}
