//! HandleStripeWebhookHandler - Reconciles Stripe webhook deliveries.

use std::sync::Arc;

use crate::domain::donation::{reference, DonationError, Provider, Receipt};
use crate::domain::foundation::{DonationId, Timestamp};
use crate::ports::{
    DonationRepository, GatewayErrorKind, StripeEventKind, StripeEventSource,
    TransitionOutcome,
};

use super::ReconcileOutcome;

/// Command carrying a raw webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleStripeWebhookCommand {
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header; absent deliveries are rejected in live
    /// mode.
    pub signature: Option<String>,
}

/// Reconciler for Stripe webhook events.
///
/// The signature-verified event is itself the source of truth: it arrives
/// over Stripe's signed channel, so no further server-to-server call is
/// needed. The payload's own status field is never read directly.
pub struct HandleStripeWebhookHandler {
    repository: Arc<dyn DonationRepository>,
    event_source: Arc<dyn StripeEventSource>,
}

impl HandleStripeWebhookHandler {
    pub fn new(
        repository: Arc<dyn DonationRepository>,
        event_source: Arc<dyn StripeEventSource>,
    ) -> Self {
        Self {
            repository,
            event_source,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleStripeWebhookCommand,
    ) -> Result<ReconcileOutcome, DonationError> {
        let event = match self
            .event_source
            .verify_and_parse(&cmd.payload, cmd.signature.as_deref())
        {
            Ok(event) => event,
            Err(e) if e.kind == GatewayErrorKind::UnrecognizedEvent => {
                // Acknowledge event types we do not act on so Stripe stops
                // retrying them.
                tracing::debug!(reason = %e.message, "Ignoring Stripe event");
                return Ok(ReconcileOutcome::Ignored(e.message));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stripe webhook rejected");
                return Err(DonationError::verification_failed(e.message));
            }
        };

        match event.kind {
            StripeEventKind::CheckoutCompleted {
                session_id,
                client_reference_id,
                amount_total_minor,
                ..
            } => {
                let Some(donation) = self
                    .find_by_client_reference(client_reference_id.as_deref())
                    .await?
                else {
                    tracing::warn!(
                        event_id = %event.id,
                        session = %reference::masked(&session_id),
                        "Checkout completed for unknown donation"
                    );
                    return Ok(ReconcileOutcome::NotFound);
                };

                if donation.is_terminal() {
                    return Ok(ReconcileOutcome::AlreadyTerminal(donation.id));
                }

                // Amount mismatches are flagged for manual audit, not fatal.
                if let Some(reported) = amount_total_minor {
                    if reported != donation.amount.minor_units() {
                        tracing::warn!(
                            donation_id = %donation.id,
                            reported_minor = reported,
                            stored_minor = donation.amount.minor_units(),
                            "Stripe amount differs from stored donation amount"
                        );
                    }
                }

                let payment_reference =
                    reference::payment_reference(Provider::Stripe, &session_id);
                let receipt = Receipt::issue(&donation.id, &Timestamp::now());
                match self
                    .repository
                    .complete_if_pending(&donation.id, &payment_reference, &receipt.number)
                    .await?
                {
                    TransitionOutcome::Applied => {
                        tracing::info!(donation_id = %donation.id, "Donation completed via Stripe");
                        Ok(ReconcileOutcome::Completed(donation.id))
                    }
                    TransitionOutcome::AlreadyTerminal => {
                        Ok(ReconcileOutcome::AlreadyTerminal(donation.id))
                    }
                }
            }

            StripeEventKind::CheckoutExpired {
                session_id,
                client_reference_id,
            } => {
                let donation = match self
                    .find_by_client_reference(client_reference_id.as_deref())
                    .await?
                {
                    Some(donation) => Some(donation),
                    None => {
                        self.repository
                            .find_by_reference(&reference::payment_reference(
                                Provider::Stripe,
                                &session_id,
                            ))
                            .await?
                    }
                };

                let Some(donation) = donation else {
                    tracing::warn!(
                        event_id = %event.id,
                        session = %reference::masked(&session_id),
                        "Checkout expired for unknown donation"
                    );
                    return Ok(ReconcileOutcome::NotFound);
                };

                self.fail(donation.id).await
            }

            StripeEventKind::PaymentFailed { payment_intent_id } => {
                let Some(donation) = self
                    .repository
                    .find_by_reference(&reference::payment_reference(
                        Provider::Stripe,
                        &payment_intent_id,
                    ))
                    .await?
                else {
                    tracing::warn!(
                        event_id = %event.id,
                        intent = %reference::masked(&payment_intent_id),
                        "Payment failure for unknown donation"
                    );
                    return Ok(ReconcileOutcome::NotFound);
                };

                self.fail(donation.id).await
            }
        }
    }

    async fn find_by_client_reference(
        &self,
        client_reference_id: Option<&str>,
    ) -> Result<Option<crate::domain::donation::Donation>, DonationError> {
        let Some(raw_id) = client_reference_id else {
            return Ok(None);
        };
        let Ok(donation_id) = raw_id.parse::<DonationId>() else {
            tracing::warn!("Stripe client_reference_id is not a donation id");
            return Ok(None);
        };
        Ok(self.repository.find_by_id(&donation_id).await?)
    }

    async fn fail(&self, id: DonationId) -> Result<ReconcileOutcome, DonationError> {
        match self.repository.fail_if_pending(&id).await? {
            TransitionOutcome::Applied => {
                tracing::info!(donation_id = %id, "Donation failed via Stripe");
                Ok(ReconcileOutcome::Failed(id))
            }
            TransitionOutcome::AlreadyTerminal => Ok(ReconcileOutcome::AlreadyTerminal(id)),
        }
    }
}
