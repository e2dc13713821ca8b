//! GetPaymentOptionsHandler - Resolves the donor-facing payment options.

use std::sync::Arc;

use crate::domain::donation::{
    resolve, ConfiguredProviders, DonationError, PaymentMode, ResolvedPaymentConfig,
};
use crate::ports::PaymentSettingsRepository;

/// Query for the current payment options (no parameters).
#[derive(Debug, Clone, Default)]
pub struct GetPaymentOptionsQuery;

/// Handler resolving the effective payment configuration for the donation
/// form: which providers are actually payable, the default currency, and
/// the recurring policy.
pub struct GetPaymentOptionsHandler {
    settings_repository: Arc<dyn PaymentSettingsRepository>,
    mode: PaymentMode,
    configured: ConfiguredProviders,
}

impl GetPaymentOptionsHandler {
    pub fn new(
        settings_repository: Arc<dyn PaymentSettingsRepository>,
        mode: PaymentMode,
        configured: ConfiguredProviders,
    ) -> Self {
        Self {
            settings_repository,
            mode,
            configured,
        }
    }

    pub async fn handle(
        &self,
        _query: GetPaymentOptionsQuery,
    ) -> Result<ResolvedPaymentConfig, DonationError> {
        let settings = self
            .settings_repository
            .load()
            .await?
            .unwrap_or_default();
        Ok(resolve(self.mode, &self.configured, &settings))
    }
}
