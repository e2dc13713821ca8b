//! Read-side port for the admin back office.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::donation::{Currency, DonationStatus};
use crate::domain::foundation::{DomainError, DonationId, Timestamp};

/// Flattened donation row for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationSummary {
    pub id: DonationId,
    pub amount: Decimal,
    pub currency: Currency,
    pub donor_name: String,
    pub donor_email: String,
    pub is_monthly: bool,
    pub status: DonationStatus,
    pub payment_reference: Option<String>,
    pub receipt_number: Option<String>,
    pub created_at: Timestamp,
}

/// Port for donation read models.
#[async_trait]
pub trait DonationReader: Send + Sync {
    /// Lists donations newest-first.
    async fn list_recent(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DonationSummary>, DomainError>;

    /// Total number of donation rows.
    async fn count(&self) -> Result<i64, DomainError>;
}
