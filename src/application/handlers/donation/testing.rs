//! In-memory port implementations shared by handler tests.

use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::donation::{
    Amount, Currency, Donation, DonationStatus, PaymentSettings, Receipt,
};
use crate::domain::foundation::{DomainError, DonationId, ErrorCode, Timestamp};
use crate::ports::{DonationRepository, PaymentSettingsRepository, TransitionOutcome};

/// Builds a pending test donation.
pub fn pending_donation(amount_minor: i64, currency: Currency) -> Donation {
    Donation::create(
        DonationId::new(),
        Amount::new(Decimal::new(amount_minor, 2)).unwrap(),
        currency,
        "Asha Tamang".to_string(),
        "asha@example.org".to_string(),
        None,
        false,
    )
}

/// In-memory donation repository mirroring the conditional-update contract
/// of the Postgres implementation.
pub struct InMemoryDonationRepository {
    donations: Mutex<Vec<Donation>>,
}

impl InMemoryDonationRepository {
    pub fn new() -> Self {
        Self {
            donations: Mutex::new(Vec::new()),
        }
    }

    pub fn with(donations: Vec<Donation>) -> Self {
        Self {
            donations: Mutex::new(donations),
        }
    }

    /// Snapshot of a stored donation, for assertions.
    pub fn get(&self, id: &DonationId) -> Option<Donation> {
        self.donations
            .lock()
            .unwrap()
            .iter()
            .find(|d| &d.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.donations.lock().unwrap().len()
    }
}

#[async_trait]
impl DonationRepository for InMemoryDonationRepository {
    async fn insert(&self, donation: &Donation) -> Result<(), DomainError> {
        self.donations.lock().unwrap().push(donation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &DonationId) -> Result<Option<Donation>, DomainError> {
        Ok(self.get(id))
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Donation>, DomainError> {
        Ok(self
            .donations
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn find_latest_by_id_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<Donation>, DomainError> {
        Ok(self
            .donations
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.id.to_string().starts_with(prefix))
            .max_by_key(|d| d.created_at)
            .cloned())
    }

    async fn attach_reference(
        &self,
        id: &DonationId,
        reference: &str,
    ) -> Result<(), DomainError> {
        let mut donations = self.donations.lock().unwrap();
        let donation = donations
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::DonationNotFound, "No such donation"))?;
        donation.payment_reference = Some(reference.to_string());
        Ok(())
    }

    async fn complete_if_pending(
        &self,
        id: &DonationId,
        reference: &str,
        receipt_number: &str,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut donations = self.donations.lock().unwrap();
        let donation = donations
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::DonationNotFound, "No such donation"))?;

        if donation.status.is_terminal() {
            return Ok(TransitionOutcome::AlreadyTerminal);
        }

        donation.status = DonationStatus::Completed;
        donation.payment_reference = Some(reference.to_string());
        donation.receipt = Some(Receipt {
            number: receipt_number.to_string(),
            url: None,
            generated_at: None,
            sent_at: None,
            download_count: 0,
        });
        donation.updated_at = Timestamp::now();
        Ok(TransitionOutcome::Applied)
    }

    async fn fail_if_pending(
        &self,
        id: &DonationId,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut donations = self.donations.lock().unwrap();
        let donation = donations
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::DonationNotFound, "No such donation"))?;

        if donation.status.is_terminal() {
            return Ok(TransitionOutcome::AlreadyTerminal);
        }

        donation.status = DonationStatus::Failed;
        donation.updated_at = Timestamp::now();
        Ok(TransitionOutcome::Applied)
    }
}

/// In-memory settings repository.
pub struct InMemorySettingsRepository {
    settings: Mutex<Option<PaymentSettings>>,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self {
            settings: Mutex::new(None),
        }
    }

    pub fn with(settings: PaymentSettings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
        }
    }
}

#[async_trait]
impl PaymentSettingsRepository for InMemorySettingsRepository {
    async fn load(&self) -> Result<Option<PaymentSettings>, DomainError> {
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn save(&self, settings: &PaymentSettings) -> Result<(), DomainError> {
        *self.settings.lock().unwrap() = Some(settings.clone());
        Ok(())
    }
}
