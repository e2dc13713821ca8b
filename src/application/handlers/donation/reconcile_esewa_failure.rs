//! ReconcileEsewaFailureHandler - Reconciles the eSewa failure redirect.

use std::sync::Arc;

use base64::Engine;
use serde::Deserialize;

use crate::domain::donation::{reference, DonationError};
use crate::ports::{DonationRepository, TransitionOutcome};

use super::ReconcileOutcome;

/// Command carrying the base64-encoded `data` query parameter.
#[derive(Debug, Clone)]
pub struct ReconcileEsewaFailureCommand {
    pub data: String,
}

#[derive(Debug, Deserialize)]
struct FailurePayload {
    transaction_uuid: String,
}

/// Reconciler for the eSewa failure path.
///
/// The gateway does not transmit the full donation id on failure, only the
/// echoed transaction UUID. The donation is recovered by the id prefix
/// inside the UUID with a starts-with scan that takes the most recently
/// created match. Two donations sharing a prefix in close succession can
/// collide; the resolved id is logged so such a case is auditable.
pub struct ReconcileEsewaFailureHandler {
    repository: Arc<dyn DonationRepository>,
}

impl ReconcileEsewaFailureHandler {
    pub fn new(repository: Arc<dyn DonationRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        cmd: ReconcileEsewaFailureCommand,
    ) -> Result<ReconcileOutcome, DonationError> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(cmd.data.trim())
            .map_err(|_| {
                DonationError::verification_failed("eSewa failure data is not valid base64")
            })?;

        let payload: FailurePayload = serde_json::from_slice(&decoded).map_err(|e| {
            DonationError::verification_failed(format!(
                "eSewa failure data is not the expected JSON: {}",
                e
            ))
        })?;

        let Some(prefix) =
            reference::id_prefix_from_transaction_uuid(&payload.transaction_uuid)
        else {
            tracing::warn!(
                transaction_uuid = %reference::masked(&payload.transaction_uuid),
                "eSewa failure with malformed transaction UUID"
            );
            return Ok(ReconcileOutcome::NotFound);
        };

        let Some(donation) = self.repository.find_latest_by_id_prefix(prefix).await? else {
            tracing::warn!(prefix, "eSewa failure matched no donation");
            return Ok(ReconcileOutcome::NotFound);
        };

        tracing::info!(
            donation_id = %donation.id,
            prefix,
            "eSewa failure resolved by id prefix"
        );

        if donation.is_terminal() {
            return Ok(ReconcileOutcome::AlreadyTerminal(donation.id));
        }

        match self.repository.fail_if_pending(&donation.id).await? {
            TransitionOutcome::Applied => {
                tracing::info!(donation_id = %donation.id, "Donation failed via eSewa");
                Ok(ReconcileOutcome::Failed(donation.id))
            }
            TransitionOutcome::AlreadyTerminal => {
                Ok(ReconcileOutcome::AlreadyTerminal(donation.id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::donation::testing::{
        pending_donation, InMemoryDonationRepository,
    };
    use crate::domain::donation::{Currency, DonationStatus};

    fn encode_payload(transaction_uuid: &str) -> String {
        let json = serde_json::json!({
            "transaction_uuid": transaction_uuid,
            "status": "FAILURE",
        });
        base64::engine::general_purpose::STANDARD.encode(json.to_string())
    }

    #[tokio::test]
    async fn failure_is_resolved_by_id_prefix() {
        let donation = pending_donation(10000, Currency::Npr);
        let id = donation.id;
        let prefix = id.short_prefix(8);
        let repository = Arc::new(InMemoryDonationRepository::with(vec![donation]));
        let handler = ReconcileEsewaFailureHandler::new(repository.clone());

        let outcome = handler
            .handle(ReconcileEsewaFailureCommand {
                data: encode_payload(&format!("169999-{}", prefix)),
            })
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Failed(id));
        assert_eq!(repository.get(&id).unwrap().status, DonationStatus::Failed);
    }

    #[tokio::test]
    async fn prefix_collision_takes_the_most_recent_donation() {
        use crate::domain::foundation::DonationId;

        // Two distinct donations whose ids share the first 8 characters.
        let mut older = pending_donation(10000, Currency::Npr);
        older.id = "aaaabbbb-0000-4000-8000-000000000001"
            .parse::<DonationId>()
            .unwrap();
        let mut newer = pending_donation(20000, Currency::Npr);
        newer.id = "aaaabbbb-0000-4000-8000-000000000002"
            .parse::<DonationId>()
            .unwrap();
        newer.created_at = older.created_at.plus_secs(30);
        newer.updated_at = newer.created_at;
        let newer_id = newer.id;

        let repository = Arc::new(InMemoryDonationRepository::with(vec![older.clone(), newer]));
        let handler = ReconcileEsewaFailureHandler::new(repository.clone());

        let outcome = handler
            .handle(ReconcileEsewaFailureCommand {
                data: encode_payload("169999-aaaabbbb"),
            })
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Failed(newer_id));
        // The older donation is untouched.
        assert_eq!(
            repository.get(&older.id).unwrap().status,
            DonationStatus::Pending
        );
    }

    #[tokio::test]
    async fn unknown_prefix_is_benign() {
        let repository = Arc::new(InMemoryDonationRepository::new());
        let handler = ReconcileEsewaFailureHandler::new(repository);

        let outcome = handler
            .handle(ReconcileEsewaFailureCommand {
                data: encode_payload("169999-deadbeef"),
            })
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::NotFound);
    }

    #[tokio::test]
    async fn completed_donation_is_not_overwritten_by_late_failure() {
        let mut donation = pending_donation(10000, Currency::Npr);
        donation.complete("esewa:REF1".to_string()).unwrap();
        let id = donation.id;
        let prefix = id.short_prefix(8);
        let repository = Arc::new(InMemoryDonationRepository::with(vec![donation]));
        let handler = ReconcileEsewaFailureHandler::new(repository.clone());

        let outcome = handler
            .handle(ReconcileEsewaFailureCommand {
                data: encode_payload(&format!("169999-{}", prefix)),
            })
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::AlreadyTerminal(id));
        let stored = repository.get(&id).unwrap();
        assert_eq!(stored.status, DonationStatus::Completed);
        assert_eq!(stored.payment_reference.as_deref(), Some("esewa:REF1"));
    }

    #[tokio::test]
    async fn invalid_base64_is_a_verification_failure() {
        let repository = Arc::new(InMemoryDonationRepository::new());
        let handler = ReconcileEsewaFailureHandler::new(repository);

        let err = handler
            .handle(ReconcileEsewaFailureCommand {
                data: "!!!not-base64!!!".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DonationError::VerificationFailed { .. }));
    }

    #[tokio::test]
    async fn json_without_transaction_uuid_is_a_verification_failure() {
        let repository = Arc::new(InMemoryDonationRepository::new());
        let handler = ReconcileEsewaFailureHandler::new(repository);

        let data =
            base64::engine::general_purpose::STANDARD.encode(r#"{"status":"FAILURE"}"#);
        let err = handler
            .handle(ReconcileEsewaFailureCommand { data })
            .await
            .unwrap_err();

        assert!(matches!(err, DonationError::VerificationFailed { .. }));
    }

    #[tokio::test]
    async fn malformed_transaction_uuid_is_benign() {
        let repository = Arc::new(InMemoryDonationRepository::new());
        let handler = ReconcileEsewaFailureHandler::new(repository);

        let outcome = handler
            .handle(ReconcileEsewaFailureCommand {
                data: encode_payload("nodashhere"),
            })
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::NotFound);
    }
}
