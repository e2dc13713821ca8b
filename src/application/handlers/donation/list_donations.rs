//! ListDonationsHandler - Admin query for recent donations.

use std::sync::Arc;

use crate::domain::donation::DonationError;
use crate::ports::{DonationReader, DonationSummary};

/// Paginated listing query.
#[derive(Debug, Clone)]
pub struct ListDonationsQuery {
    pub limit: i64,
    pub offset: i64,
}

/// Listing result with the total row count for pagination.
#[derive(Debug, Clone)]
pub struct ListDonationsResult {
    pub donations: Vec<DonationSummary>,
    pub total: i64,
}

/// Handler for the admin back-office donation listing.
pub struct ListDonationsHandler {
    reader: Arc<dyn DonationReader>,
}

impl ListDonationsHandler {
    pub fn new(reader: Arc<dyn DonationReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: ListDonationsQuery,
    ) -> Result<ListDonationsResult, DonationError> {
        let limit = query.limit.clamp(1, 100);
        let offset = query.offset.max(0);

        let donations = self.reader.list_recent(limit, offset).await?;
        let total = self.reader.count().await?;

        Ok(ListDonationsResult { donations, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::donation::{Currency, DonationStatus};
    use crate::domain::foundation::{DomainError, DonationId, Timestamp};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    struct FakeReader {
        summaries: Vec<DonationSummary>,
        last_args: Mutex<Option<(i64, i64)>>,
    }

    #[async_trait]
    impl DonationReader for FakeReader {
        async fn list_recent(
            &self,
            limit: i64,
            offset: i64,
        ) -> Result<Vec<DonationSummary>, DomainError> {
            *self.last_args.lock().unwrap() = Some((limit, offset));
            Ok(self.summaries.clone())
        }

        async fn count(&self) -> Result<i64, DomainError> {
            Ok(self.summaries.len() as i64)
        }
    }

    fn summary() -> DonationSummary {
        DonationSummary {
            id: DonationId::new(),
            amount: Decimal::new(2500, 2),
            currency: Currency::Usd,
            donor_name: "Asha Tamang".to_string(),
            donor_email: "asha@example.org".to_string(),
            is_monthly: false,
            status: DonationStatus::Pending,
            payment_reference: None,
            receipt_number: None,
            created_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn returns_summaries_and_total() {
        let reader = Arc::new(FakeReader {
            summaries: vec![summary(), summary()],
            last_args: Mutex::new(None),
        });
        let handler = ListDonationsHandler::new(reader);

        let result = handler
            .handle(ListDonationsQuery {
                limit: 20,
                offset: 0,
            })
            .await
            .unwrap();

        assert_eq!(result.donations.len(), 2);
        assert_eq!(result.total, 2);
    }

    #[tokio::test]
    async fn clamps_oversized_limits() {
        let reader = Arc::new(FakeReader {
            summaries: vec![],
            last_args: Mutex::new(None),
        });
        let handler = ListDonationsHandler::new(reader.clone());

        handler
            .handle(ListDonationsQuery {
                limit: 10_000,
                offset: -5,
            })
            .await
            .unwrap();

        assert_eq!(*reader.last_args.lock().unwrap(), Some((100, 0)));
    }
}
