//! GetDonationHandler - Query handler for a single donation.

use std::sync::Arc;

use crate::domain::donation::{Donation, DonationError};
use crate::domain::foundation::DonationId;
use crate::ports::DonationRepository;

/// Query for one donation by id.
#[derive(Debug, Clone)]
pub struct GetDonationQuery {
    pub donation_id: DonationId,
}

/// Handler backing the donor-facing status lookup on the landing pages.
pub struct GetDonationHandler {
    repository: Arc<dyn DonationRepository>,
}

impl GetDonationHandler {
    pub fn new(repository: Arc<dyn DonationRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        query: GetDonationQuery,
    ) -> Result<Option<Donation>, DonationError> {
        Ok(self.repository.find_by_id(&query.donation_id).await?)
    }
}
