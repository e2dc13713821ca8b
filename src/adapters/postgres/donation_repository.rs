//! PostgreSQL implementation of the donation ledger ports.
//!
//! The terminal transitions are single conditional updates
//! (`... WHERE status = 'pending'`): under concurrent reconcilers exactly
//! one write wins and the loser observes zero affected rows, which is
//! reported as `AlreadyTerminal`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::donation::{Amount, Currency, Donation, DonationStatus, Receipt};
use crate::domain::foundation::{DomainError, DonationId, ErrorCode, Timestamp};
use crate::ports::{
    DonationReader, DonationRepository, DonationSummary, TransitionOutcome,
};

/// PostgreSQL implementation of the DonationRepository port.
pub struct PostgresDonationRepository {
    pool: PgPool,
}

impl PostgresDonationRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a donation.
#[derive(Debug, sqlx::FromRow)]
struct DonationRow {
    id: Uuid,
    amount: Decimal,
    currency: String,
    donor_name: String,
    donor_email: String,
    donor_phone: Option<String>,
    is_monthly: bool,
    status: String,
    payment_reference: Option<String>,
    receipt_number: Option<String>,
    receipt_url: Option<String>,
    receipt_generated_at: Option<DateTime<Utc>>,
    receipt_sent_at: Option<DateTime<Utc>>,
    receipt_download_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for Donation {
    type Error = DomainError;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        let currency = parse_currency(&row.currency)?;
        let status = parse_status(&row.status)?;
        let amount = Amount::new(row.amount).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid amount: {}", e))
        })?;

        let receipt = row.receipt_number.map(|number| Receipt {
            number,
            url: row.receipt_url,
            generated_at: row.receipt_generated_at.map(Timestamp::from_datetime),
            sent_at: row.receipt_sent_at.map(Timestamp::from_datetime),
            download_count: row.receipt_download_count,
        });

        Ok(Donation {
            id: DonationId::from_uuid(row.id),
            amount,
            currency,
            donor_name: row.donor_name,
            donor_email: row.donor_email,
            donor_phone: row.donor_phone,
            is_monthly: row.is_monthly,
            status,
            payment_reference: row.payment_reference,
            receipt,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_currency(s: &str) -> Result<Currency, DomainError> {
    Currency::parse(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid currency value: {}", s),
        )
    })
}

fn parse_status(s: &str) -> Result<DonationStatus, DomainError> {
    DonationStatus::parse(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )
    })
}

const SELECT_DONATION: &str = r#"
    SELECT id, amount, currency, donor_name, donor_email, donor_phone,
           is_monthly, status, payment_reference, receipt_number, receipt_url,
           receipt_generated_at, receipt_sent_at, receipt_download_count,
           created_at, updated_at
    FROM donations
"#;

#[async_trait]
impl DonationRepository for PostgresDonationRepository {
    async fn insert(&self, donation: &Donation) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO donations (
                id, amount, currency, donor_name, donor_email, donor_phone,
                is_monthly, status, payment_reference, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(donation.id.as_uuid())
        .bind(donation.amount.value())
        .bind(donation.currency.as_str())
        .bind(&donation.donor_name)
        .bind(&donation.donor_email)
        .bind(&donation.donor_phone)
        .bind(donation.is_monthly)
        .bind(donation.status.as_str())
        .bind(&donation.payment_reference)
        .bind(donation.created_at.as_datetime())
        .bind(donation.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert donation: {}", e),
            )
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &DonationId) -> Result<Option<Donation>, DomainError> {
        let row: Option<DonationRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_DONATION))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to load donation: {}", e),
                    )
                })?;

        row.map(Donation::try_from).transpose()
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Donation>, DomainError> {
        let row: Option<DonationRow> =
            sqlx::query_as(&format!("{} WHERE payment_reference = $1", SELECT_DONATION))
                .bind(reference)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to load donation by reference: {}", e),
                    )
                })?;

        row.map(Donation::try_from).transpose()
    }

    async fn find_latest_by_id_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<Donation>, DomainError> {
        // The id fragment echoed by eSewa is matched with a starts-with
        // scan; the newest row wins when several match.
        let row: Option<DonationRow> = sqlx::query_as(&format!(
            "{} WHERE id::text LIKE $1 || '%' ORDER BY created_at DESC LIMIT 1",
            SELECT_DONATION
        ))
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to scan donations by prefix: {}", e),
            )
        })?;

        row.map(Donation::try_from).transpose()
    }

    async fn attach_reference(
        &self,
        id: &DonationId,
        reference: &str,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE donations
            SET payment_reference = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.as_uuid())
        .bind(reference)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to attach reference: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::DonationNotFound,
                "No pending donation to attach reference to",
            ));
        }

        Ok(())
    }

    async fn complete_if_pending(
        &self,
        id: &DonationId,
        reference: &str,
        receipt_number: &str,
    ) -> Result<TransitionOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE donations
            SET status = 'completed',
                payment_reference = $2,
                receipt_number = $3,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.as_uuid())
        .bind(reference)
        .bind(receipt_number)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to complete donation: {}", e),
            )
        })?;

        self.classify_conditional_update(id, result.rows_affected())
            .await
    }

    async fn fail_if_pending(
        &self,
        id: &DonationId,
    ) -> Result<TransitionOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE donations
            SET status = 'failed', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to mark donation failed: {}", e),
            )
        })?;

        self.classify_conditional_update(id, result.rows_affected())
            .await
    }
}

impl PostgresDonationRepository {
    /// Distinguishes "lost the race" from "row never existed" after a
    /// conditional update touched zero rows.
    async fn classify_conditional_update(
        &self,
        id: &DonationId,
        rows_affected: u64,
    ) -> Result<TransitionOutcome, DomainError> {
        if rows_affected > 0 {
            return Ok(TransitionOutcome::Applied);
        }

        let exists: Option<(String,)> =
            sqlx::query_as("SELECT status FROM donations WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to read donation status: {}", e),
                    )
                })?;

        match exists {
            Some(_) => Ok(TransitionOutcome::AlreadyTerminal),
            None => Err(DomainError::new(
                ErrorCode::DonationNotFound,
                "Donation does not exist",
            )),
        }
    }
}

/// PostgreSQL implementation of the DonationReader port.
pub struct PostgresDonationReader {
    pool: PgPool,
}

impl PostgresDonationReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: Uuid,
    amount: Decimal,
    currency: String,
    donor_name: String,
    donor_email: String,
    is_monthly: bool,
    status: String,
    payment_reference: Option<String>,
    receipt_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SummaryRow> for DonationSummary {
    type Error = DomainError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(DonationSummary {
            id: DonationId::from_uuid(row.id),
            amount: row.amount,
            currency: parse_currency(&row.currency)?,
            donor_name: row.donor_name,
            donor_email: row.donor_email,
            is_monthly: row.is_monthly,
            status: parse_status(&row.status)?,
            payment_reference: row.payment_reference,
            receipt_number: row.receipt_number,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl DonationReader for PostgresDonationReader {
    async fn list_recent(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DonationSummary>, DomainError> {
        let rows: Vec<SummaryRow> = sqlx::query_as(
            r#"
            SELECT id, amount, currency, donor_name, donor_email, is_monthly,
                   status, payment_reference, receipt_number, created_at
            FROM donations
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list donations: {}", e),
            )
        })?;

        rows.into_iter().map(DonationSummary::try_from).collect()
    }

    async fn count(&self) -> Result<i64, DomainError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM donations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to count donations: {}", e),
                )
            })?;

        Ok(count.0)
    }
}
