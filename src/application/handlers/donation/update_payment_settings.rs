//! UpdatePaymentSettingsHandler - Admin command writing payment settings.

use std::sync::Arc;

use crate::domain::donation::{
    Currency, DonationError, PaymentSettings, Provider,
};
use crate::domain::foundation::Timestamp;
use crate::ports::PaymentSettingsRepository;

/// Command replacing the payment settings record.
///
/// Role gating happens at the HTTP boundary; this handler assumes an
/// already-authorized caller.
#[derive(Debug, Clone)]
pub struct UpdatePaymentSettingsCommand {
    pub enabled_providers: Vec<Provider>,
    pub primary_provider: Provider,
    pub default_currency: Currency,
    pub allow_recurring: bool,
}

/// Handler for the administrative payment settings write.
pub struct UpdatePaymentSettingsHandler {
    settings_repository: Arc<dyn PaymentSettingsRepository>,
}

impl UpdatePaymentSettingsHandler {
    pub fn new(settings_repository: Arc<dyn PaymentSettingsRepository>) -> Self {
        Self {
            settings_repository,
        }
    }

    pub async fn handle(
        &self,
        cmd: UpdatePaymentSettingsCommand,
    ) -> Result<PaymentSettings, DonationError> {
        if cmd.enabled_providers.is_empty() {
            return Err(DonationError::validation(
                "enabled_providers",
                "at least one provider must be enabled",
            ));
        }
        if !cmd.enabled_providers.contains(&cmd.primary_provider) {
            return Err(DonationError::validation(
                "primary_provider",
                "must be one of the enabled providers",
            ));
        }

        let settings = PaymentSettings {
            enabled_providers: cmd.enabled_providers,
            primary_provider: cmd.primary_provider,
            default_currency: cmd.default_currency,
            allow_recurring: cmd.allow_recurring,
            updated_at: Timestamp::now(),
        };

        self.settings_repository.save(&settings).await?;

        tracing::info!(
            primary = %settings.primary_provider,
            enabled = settings.enabled_providers.len(),
            "Payment settings updated"
        );

        Ok(settings)
    }
}
