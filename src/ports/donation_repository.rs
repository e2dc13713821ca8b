//! Donation ledger persistence port.

use async_trait::async_trait;

use crate::domain::donation::Donation;
use crate::domain::foundation::{DomainError, DonationId};

/// Result of a conditional terminal-state write.
///
/// Reconcilers race: a failure webhook may arrive while a success redirect
/// is being processed. The repository applies a terminal transition only if
/// the row is still `pending`; the loser of the race observes
/// `AlreadyTerminal` and must treat it as a no-op, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// This caller won the conditional update.
    Applied,
    /// The donation was already terminal; nothing was written.
    AlreadyTerminal,
}

/// Port for donation aggregate persistence.
#[async_trait]
pub trait DonationRepository: Send + Sync {
    /// Inserts a new pending donation.
    async fn insert(&self, donation: &Donation) -> Result<(), DomainError>;

    /// Finds a donation by primary key.
    async fn find_by_id(&self, id: &DonationId) -> Result<Option<Donation>, DomainError>;

    /// Finds a donation by exact payment-reference match.
    async fn find_by_reference(&self, reference: &str)
        -> Result<Option<Donation>, DomainError>;

    /// Finds the most recently created donation whose id starts with
    /// `prefix`.
    ///
    /// Used by the eSewa failure path, which only receives an id fragment
    /// inside the echoed transaction UUID. Multiple rows may match; the
    /// newest wins.
    async fn find_latest_by_id_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<Donation>, DomainError>;

    /// Attaches the gateway reference to a pending donation.
    async fn attach_reference(
        &self,
        id: &DonationId,
        reference: &str,
    ) -> Result<(), DomainError>;

    /// Conditionally transitions `pending -> completed`, confirming the
    /// payment reference and recording the receipt number.
    ///
    /// Must be implemented as a single conditional write
    /// (`... WHERE status = 'pending'`) so that concurrent reconcilers
    /// cannot both apply a terminal state.
    async fn complete_if_pending(
        &self,
        id: &DonationId,
        reference: &str,
        receipt_number: &str,
    ) -> Result<TransitionOutcome, DomainError>;

    /// Conditionally transitions `pending -> failed`.
    async fn fail_if_pending(&self, id: &DonationId)
        -> Result<TransitionOutcome, DomainError>;
}
