//! ReconcileEsewaSuccessHandler - Reconciles the eSewa success redirect.

use std::sync::Arc;

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::donation::{reference, DonationError, PaymentMode, Provider, Receipt};
use crate::domain::foundation::Timestamp;
use crate::ports::{DonationRepository, EsewaVerification, TransitionOutcome};

use super::ReconcileOutcome;

/// Command carrying the success-redirect query parameters.
///
/// eSewa sends `refId` (its transaction code), `oid`/`pid` (our composite
/// reference), and `amt`.
#[derive(Debug, Clone)]
pub struct ReconcileEsewaSuccessCommand {
    pub ref_id: String,
    pub product_id: String,
    pub amount: String,
}

/// Reconciler for the eSewa success path.
///
/// The redirect parameters come from the donor's browser and are never
/// trusted: live mode confirms the transaction with the `transrec`
/// endpoint before completing the donation.
pub struct ReconcileEsewaSuccessHandler {
    repository: Arc<dyn DonationRepository>,
    verification: Arc<dyn EsewaVerification>,
    mode: PaymentMode,
}

impl ReconcileEsewaSuccessHandler {
    pub fn new(
        repository: Arc<dyn DonationRepository>,
        verification: Arc<dyn EsewaVerification>,
        mode: PaymentMode,
    ) -> Self {
        Self {
            repository,
            verification,
            mode,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReconcileEsewaSuccessCommand,
    ) -> Result<ReconcileOutcome, DonationError> {
        // The donation id is embedded in the composite `esewa_<id>` reference.
        let Some(donation_id) = reference::donation_id_from_esewa_reference(&cmd.product_id)
        else {
            tracing::warn!(
                pid = %reference::masked(&cmd.product_id),
                "eSewa success with unparseable product id"
            );
            return Ok(ReconcileOutcome::NotFound);
        };

        let Some(donation) = self.repository.find_by_id(&donation_id).await? else {
            tracing::warn!(
                donation_id = %donation_id,
                "eSewa success for unknown donation"
            );
            return Ok(ReconcileOutcome::NotFound);
        };

        if donation.is_terminal() {
            return Ok(ReconcileOutcome::AlreadyTerminal(donation.id));
        }

        // Live mode confirms with the gateway; mock mode completes directly.
        if !self.mode.is_mock() {
            let verified = self
                .verification
                .verify_transaction(&cmd.ref_id, &cmd.amount, &cmd.product_id)
                .await
                .map_err(|e| {
                    tracing::error!(
                        donation_id = %donation.id,
                        error = %e,
                        "eSewa transrec call failed"
                    );
                    DonationError::verification_failed(e.message)
                })?;

            if !verified {
                tracing::info!(
                    donation_id = %donation.id,
                    "eSewa did not confirm the transaction"
                );
                return match self.repository.fail_if_pending(&donation.id).await? {
                    TransitionOutcome::Applied => Ok(ReconcileOutcome::Failed(donation.id)),
                    TransitionOutcome::AlreadyTerminal => {
                        Ok(ReconcileOutcome::AlreadyTerminal(donation.id))
                    }
                };
            }
        }

        // Amount mismatches are flagged for manual audit, not fatal.
        match Decimal::from_str(&cmd.amount) {
            Ok(reported) if reported != donation.amount.value().normalize() => {
                tracing::warn!(
                    donation_id = %donation.id,
                    reported = %reported,
                    stored = %donation.amount,
                    "eSewa amount differs from stored donation amount"
                );
            }
            Err(_) => {
                tracing::warn!(
                    donation_id = %donation.id,
                    "eSewa amount parameter is not numeric"
                );
            }
            _ => {}
        }

        let payment_reference = reference::payment_reference(Provider::Esewa, &cmd.ref_id);
        let receipt = Receipt::issue(&donation.id, &Timestamp::now());
        match self
            .repository
            .complete_if_pending(&donation.id, &payment_reference, &receipt.number)
            .await?
        {
            TransitionOutcome::Applied => {
                tracing::info!(donation_id = %donation.id, "Donation completed via eSewa");
                Ok(ReconcileOutcome::Completed(donation.id))
            }
            TransitionOutcome::AlreadyTerminal => {
                Ok(ReconcileOutcome::AlreadyTerminal(donation.id))
            }
        }
    }
}
