//! StartDonationHandler - Command handler for initiating a donation.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::donation::{
    resolve, Amount, ConfiguredProviders, Donation, DonationError, PaymentMode,
    PaymentSettings, Provider,
};
use crate::domain::foundation::DonationId;
use crate::ports::{
    DonationRepository, GatewayRegistry, InitiateRequest, PaymentSettingsRepository,
};

/// Command to start a donation through a chosen provider.
#[derive(Debug, Clone)]
pub struct StartDonationCommand {
    pub amount: Decimal,
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: Option<String>,
    pub is_monthly: bool,
    pub provider: Provider,
}

/// Result of a successfully initiated donation.
#[derive(Debug, Clone)]
pub struct StartDonationResult {
    pub donation_id: DonationId,
    /// URL the caller forwards the donor's browser to.
    pub redirect_url: String,
}

/// Orchestrates donation creation and payment initiation.
///
/// Creates a `pending` donation, delegates to the selected gateway, and
/// persists the resulting transaction reference. If the gateway cannot
/// produce a redirect the pending row is left in place: orphaned pending
/// rows are an accepted, observable artifact.
pub struct StartDonationHandler {
    repository: Arc<dyn DonationRepository>,
    settings_repository: Arc<dyn PaymentSettingsRepository>,
    registry: GatewayRegistry,
    mode: PaymentMode,
    configured: ConfiguredProviders,
}

impl StartDonationHandler {
    pub fn new(
        repository: Arc<dyn DonationRepository>,
        settings_repository: Arc<dyn PaymentSettingsRepository>,
        registry: GatewayRegistry,
        mode: PaymentMode,
        configured: ConfiguredProviders,
    ) -> Self {
        Self {
            repository,
            settings_repository,
            registry,
            mode,
            configured,
        }
    }

    pub async fn handle(
        &self,
        cmd: StartDonationCommand,
    ) -> Result<StartDonationResult, DonationError> {
        // 1. Validate donor input before creating any state.
        let amount = Amount::new(cmd.amount)
            .map_err(|_| DonationError::validation("amount", "must be a positive number"))?;
        if cmd.donor_name.trim().is_empty() {
            return Err(DonationError::validation("donor_name", "is required"));
        }
        if cmd.donor_email.trim().is_empty() || !cmd.donor_email.contains('@') {
            return Err(DonationError::validation(
                "donor_email",
                "a valid email address is required",
            ));
        }

        // 2. Resolve the effective payment configuration for this request.
        let settings: PaymentSettings = self
            .settings_repository
            .load()
            .await?
            .unwrap_or_default();
        let resolved = resolve(self.mode, &self.configured, &settings);

        if !resolved.is_enabled(cmd.provider) {
            return Err(DonationError::provider_unavailable(cmd.provider));
        }
        if cmd.is_monthly && !resolved.allow_recurring {
            return Err(DonationError::validation(
                "is_monthly",
                "recurring donations are not enabled",
            ));
        }

        let gateway = self
            .registry
            .get(cmd.provider)
            .ok_or_else(|| DonationError::provider_unavailable(cmd.provider))?;

        // 3. Insert the pending donation, then initiate with the gateway.
        let currency = resolved.currency_for(cmd.provider);
        let donation = Donation::create(
            DonationId::new(),
            amount,
            currency,
            cmd.donor_name.trim().to_string(),
            cmd.donor_email.trim().to_string(),
            cmd.donor_phone.filter(|p| !p.trim().is_empty()),
            cmd.is_monthly,
        );
        self.repository.insert(&donation).await?;

        let initiated = gateway
            .initiate(InitiateRequest {
                donation_id: donation.id,
                amount,
                currency,
                donor_name: donation.donor_name.clone(),
                donor_email: donation.donor_email.clone(),
                is_monthly: donation.is_monthly,
            })
            .await
            .map_err(|e| {
                // The pending row stays; a later sweep or manual audit can
                // see the attempt.
                tracing::warn!(
                    donation_id = %donation.id,
                    provider = %cmd.provider,
                    error = %e,
                    "Payment initiation failed, pending donation retained"
                );
                DonationError::initiation_failed(e.message)
            })?;

        // 4. Persist the gateway reference on the donation row.
        self.repository
            .attach_reference(&donation.id, &initiated.reference)
            .await?;

        tracing::info!(
            donation_id = %donation.id,
            provider = %cmd.provider,
            currency = %currency,
            "Donation initiated"
        );

        Ok(StartDonationResult {
            donation_id: donation.id,
            redirect_url: initiated.redirect_url,
        })
    }
}
