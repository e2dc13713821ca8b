//! VerifyKhaltiPaymentHandler - Reconciles a Khalti payment by pidx.

use std::sync::Arc;

use crate::domain::donation::{reference, DonationError, PaymentMode, Receipt};
use crate::domain::foundation::Timestamp;
use crate::ports::{DonationRepository, KhaltiLookup, TransitionOutcome};

use super::ReconcileOutcome;

/// Khalti lookup status that maps to a completed donation.
const KHALTI_STATUS_COMPLETED: &str = "Completed";

/// Command carrying the payment index from the return page.
#[derive(Debug, Clone)]
pub struct VerifyKhaltiPaymentCommand {
    pub pidx: String,
}

/// Reconciler for Khalti payments.
///
/// The pidx arrives from the donor's browser, so it is never trusted: the
/// donation's outcome comes from a server-to-server lookup call. Provider
/// status `"Completed"` maps to completed; every other status maps to
/// failed.
pub struct VerifyKhaltiPaymentHandler {
    repository: Arc<dyn DonationRepository>,
    lookup: Arc<dyn KhaltiLookup>,
    mode: PaymentMode,
}

impl VerifyKhaltiPaymentHandler {
    pub fn new(
        repository: Arc<dyn DonationRepository>,
        lookup: Arc<dyn KhaltiLookup>,
        mode: PaymentMode,
    ) -> Self {
        Self {
            repository,
            lookup,
            mode,
        }
    }

    pub async fn handle(
        &self,
        cmd: VerifyKhaltiPaymentCommand,
    ) -> Result<ReconcileOutcome, DonationError> {
        let payment_reference = reference::khalti_reference(&cmd.pidx);

        let Some(donation) = self
            .repository
            .find_by_reference(&payment_reference)
            .await?
        else {
            tracing::warn!(
                pidx = %reference::masked(&cmd.pidx),
                "Khalti verify for unknown donation"
            );
            return Ok(ReconcileOutcome::NotFound);
        };

        if donation.is_terminal() {
            return Ok(ReconcileOutcome::AlreadyTerminal(donation.id));
        }

        // Mock mode completes without contacting the provider.
        if self.mode.is_mock() {
            return self.complete(&donation, &payment_reference).await;
        }

        let lookup = self.lookup.lookup(&cmd.pidx).await.map_err(|e| {
            tracing::error!(
                donation_id = %donation.id,
                error = %e,
                "Khalti lookup call failed"
            );
            DonationError::verification_failed(e.message)
        })?;

        if lookup.total_amount_paisa != donation.amount.minor_units() {
            tracing::warn!(
                donation_id = %donation.id,
                reported_paisa = lookup.total_amount_paisa,
                stored_paisa = donation.amount.minor_units(),
                "Khalti amount differs from stored donation amount"
            );
        }

        if lookup.status == KHALTI_STATUS_COMPLETED {
            self.complete(&donation, &payment_reference).await
        } else {
            tracing::info!(
                donation_id = %donation.id,
                status = %lookup.status,
                "Khalti reported non-completed status"
            );
            match self.repository.fail_if_pending(&donation.id).await? {
                TransitionOutcome::Applied => Ok(ReconcileOutcome::Failed(donation.id)),
                TransitionOutcome::AlreadyTerminal => {
                    Ok(ReconcileOutcome::AlreadyTerminal(donation.id))
                }
            }
        }
    }

    async fn complete(
        &self,
        donation: &crate::domain::donation::Donation,
        payment_reference: &str,
    ) -> Result<ReconcileOutcome, DonationError> {
        let receipt = Receipt::issue(&donation.id, &Timestamp::now());
        match self
            .repository
            .complete_if_pending(&donation.id, payment_reference, &receipt.number)
            .await?
        {
            TransitionOutcome::Applied => {
                tracing::info!(donation_id = %donation.id, "Donation completed via Khalti");
                Ok(ReconcileOutcome::Completed(donation.id))
            }
            TransitionOutcome::AlreadyTerminal => {
                Ok(ReconcileOutcome::AlreadyTerminal(donation.id))
            }
        }
    }
}
