//! PostgreSQL implementation of the payment settings repository.
//!
//! The settings live in a single-row table; writes upsert that row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::donation::{Currency, PaymentSettings, Provider};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::PaymentSettingsRepository;

/// PostgreSQL implementation of the PaymentSettingsRepository port.
pub struct PostgresSettingsRepository {
    pool: PgPool,
}

impl PostgresSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    enabled_providers: Vec<String>,
    primary_provider: String,
    default_currency: String,
    allow_recurring: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SettingsRow> for PaymentSettings {
    type Error = DomainError;

    fn try_from(row: SettingsRow) -> Result<Self, Self::Error> {
        let enabled_providers = row
            .enabled_providers
            .iter()
            .map(|s| {
                Provider::parse(s).ok_or_else(|| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Invalid provider value: {}", s),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let primary_provider = Provider::parse(&row.primary_provider).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid primary provider: {}", row.primary_provider),
            )
        })?;

        let default_currency = Currency::parse(&row.default_currency).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid currency value: {}", row.default_currency),
            )
        })?;

        Ok(PaymentSettings {
            enabled_providers,
            primary_provider,
            default_currency,
            allow_recurring: row.allow_recurring,
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl PaymentSettingsRepository for PostgresSettingsRepository {
    async fn load(&self) -> Result<Option<PaymentSettings>, DomainError> {
        let row: Option<SettingsRow> = sqlx::query_as(
            r#"
            SELECT enabled_providers, primary_provider, default_currency,
                   allow_recurring, updated_at
            FROM payment_settings
            WHERE id = TRUE
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to load payment settings: {}", e),
            )
        })?;

        row.map(PaymentSettings::try_from).transpose()
    }

    async fn save(&self, settings: &PaymentSettings) -> Result<(), DomainError> {
        let providers: Vec<String> = settings
            .enabled_providers
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();

        sqlx::query(
            r#"
            INSERT INTO payment_settings (
                id, enabled_providers, primary_provider, default_currency,
                allow_recurring, updated_at
            ) VALUES (TRUE, $1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                enabled_providers = EXCLUDED.enabled_providers,
                primary_provider = EXCLUDED.primary_provider,
                default_currency = EXCLUDED.default_currency,
                allow_recurring = EXCLUDED.allow_recurring,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&providers)
        .bind(settings.primary_provider.as_str())
        .bind(settings.default_currency.as_str())
        .bind(settings.allow_recurring)
        .bind(settings.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to save payment settings: {}", e),
            )
        })?;

        Ok(())
    }
}
