//! The Donation aggregate.
//!
//! A donation is created `pending` with no payment reference, gains its
//! reference when the gateway adapter responds, and is moved to exactly one
//! terminal state by whichever reconciler wins. The aggregate enforces the
//! same transition rules the persistence layer enforces with its
//! conditional update, so in-memory implementations behave identically.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DonationId, Timestamp};

use super::amount::{Amount, Currency};
use super::errors::DonationError;
use super::status::DonationStatus;

/// Receipt details, populated only after a donation completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Receipt number, assigned at the completion transition.
    pub number: String,

    /// URL of the rendered receipt document, if generated.
    pub url: Option<String>,

    /// When the receipt document was generated.
    pub generated_at: Option<Timestamp>,

    /// When the receipt was emailed to the donor.
    pub sent_at: Option<Timestamp>,

    /// How many times the donor downloaded the receipt.
    pub download_count: i32,
}

impl Receipt {
    /// Creates the receipt record assigned at completion.
    pub fn issue(donation_id: &DonationId, completed_at: &Timestamp) -> Self {
        use chrono::Datelike;
        Self {
            number: format!(
                "R-{}-{}",
                completed_at.as_datetime().year(),
                donation_id.short_prefix(8).to_uppercase()
            ),
            url: None,
            generated_at: None,
            sent_at: None,
            download_count: 0,
        }
    }
}

/// The persistent record of one donor's payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub id: DonationId,
    pub amount: Amount,
    pub currency: Currency,
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: Option<String>,
    /// One-time vs monthly recurrence.
    pub is_monthly: bool,
    pub status: DonationStatus,
    /// `<provider>:<transaction id>` (or the composite `esewa_<id>` form
    /// before the eSewa callback confirms). None until the adapter responds.
    pub payment_reference: Option<String>,
    pub receipt: Option<Receipt>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Donation {
    /// Creates a new pending donation with no payment reference.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        id: DonationId,
        amount: Amount,
        currency: Currency,
        donor_name: String,
        donor_email: String,
        donor_phone: Option<String>,
        is_monthly: bool,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            amount,
            currency,
            donor_name,
            donor_email,
            donor_phone,
            is_monthly,
            status: DonationStatus::Pending,
            payment_reference: None,
            receipt: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the donation has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Attaches the gateway transaction reference after initiation.
    pub fn attach_reference(&mut self, reference: String) -> Result<(), DonationError> {
        if self.is_terminal() {
            return Err(DonationError::already_terminal(self.id, self.status));
        }
        self.payment_reference = Some(reference);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Transitions `pending -> completed`, confirming the payment reference
    /// and issuing the receipt number.
    pub fn complete(&mut self, reference: String) -> Result<(), DonationError> {
        if self.is_terminal() {
            return Err(DonationError::already_terminal(self.id, self.status));
        }
        let now = Timestamp::now();
        self.status = DonationStatus::Completed;
        self.payment_reference = Some(reference);
        self.receipt = Some(Receipt::issue(&self.id, &now));
        self.updated_at = now;
        Ok(())
    }

    /// Transitions `pending -> failed`.
    pub fn fail(&mut self) -> Result<(), DonationError> {
        if self.is_terminal() {
            return Err(DonationError::already_terminal(self.id, self.status));
        }
        self.status = DonationStatus::Failed;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}
