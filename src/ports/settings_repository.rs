//! Payment settings persistence port.

use async_trait::async_trait;

use crate::domain::donation::PaymentSettings;
use crate::domain::foundation::DomainError;

/// Port for the singleton payment settings record.
#[async_trait]
pub trait PaymentSettingsRepository: Send + Sync {
    /// Loads the persisted settings, or `None` if never written.
    async fn load(&self) -> Result<Option<PaymentSettings>, DomainError>;

    /// Persists the settings record, replacing any previous one.
    async fn save(&self, settings: &PaymentSettings) -> Result<(), DomainError>;
}
