//! HTTP handlers for donation endpoints.
//!
//! These handlers connect Axum routes to application layer command/query
//! handlers. Browser-facing callbacks answer with redirects to the public
//! site; webhook/verify callbacks answer with JSON.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};

use crate::application::handlers::donation::{
    GetDonationHandler, GetDonationQuery, GetPaymentOptionsHandler, GetPaymentOptionsQuery,
    HandleStripeWebhookCommand, HandleStripeWebhookHandler, ListDonationsHandler,
    ListDonationsQuery, ReconcileEsewaFailureCommand, ReconcileEsewaFailureHandler,
    ReconcileEsewaSuccessCommand, ReconcileEsewaSuccessHandler, ReconcileOutcome,
    StartDonationCommand, StartDonationHandler, UpdatePaymentSettingsCommand,
    UpdatePaymentSettingsHandler, VerifyKhaltiPaymentCommand, VerifyKhaltiPaymentHandler,
};
use crate::domain::donation::{ConfiguredProviders, DonationError, PaymentMode};
use crate::domain::foundation::DonationId;
use crate::ports::{
    DonationReader, DonationRepository, EsewaVerification, GatewayRegistry, KhaltiLookup,
    PaymentSettingsRepository, StripeEventSource,
};

use super::dto::{
    DonationListResponse, DonationResponse, DonationSummaryResponse, ErrorResponse,
    KhaltiVerifyRequest, ListDonationsParams, PaymentOptionsResponse,
    PaymentSettingsResponse, ReconcileResponse, StartDonationRequest, StartDonationResponse,
    UpdatePaymentSettingsRequest, WebhookAckResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all donation dependencies.
///
/// Cloned per request; dependencies are Arc-wrapped for cheap sharing.
#[derive(Clone)]
pub struct DonationAppState {
    pub repository: Arc<dyn DonationRepository>,
    pub reader: Arc<dyn DonationReader>,
    pub settings_repository: Arc<dyn PaymentSettingsRepository>,
    pub registry: GatewayRegistry,
    pub stripe_events: Arc<dyn StripeEventSource>,
    pub khalti_lookup: Arc<dyn KhaltiLookup>,
    pub esewa_verification: Arc<dyn EsewaVerification>,
    pub mode: PaymentMode,
    pub configured: ConfiguredProviders,
    /// HS256 secret for admin bearer tokens.
    pub admin_jwt_secret: String,
    /// Public website base URL for donor-facing redirects.
    pub site_url: String,
}

impl DonationAppState {
    /// Create handlers on demand from the shared state.
    pub fn start_donation_handler(&self) -> StartDonationHandler {
        StartDonationHandler::new(
            self.repository.clone(),
            self.settings_repository.clone(),
            self.registry.clone(),
            self.mode,
            self.configured,
        )
    }

    pub fn get_donation_handler(&self) -> GetDonationHandler {
        GetDonationHandler::new(self.repository.clone())
    }

    pub fn payment_options_handler(&self) -> GetPaymentOptionsHandler {
        GetPaymentOptionsHandler::new(
            self.settings_repository.clone(),
            self.mode,
            self.configured,
        )
    }

    pub fn stripe_webhook_handler(&self) -> HandleStripeWebhookHandler {
        HandleStripeWebhookHandler::new(self.repository.clone(), self.stripe_events.clone())
    }

    pub fn khalti_verify_handler(&self) -> VerifyKhaltiPaymentHandler {
        VerifyKhaltiPaymentHandler::new(
            self.repository.clone(),
            self.khalti_lookup.clone(),
            self.mode,
        )
    }

    pub fn esewa_success_handler(&self) -> ReconcileEsewaSuccessHandler {
        ReconcileEsewaSuccessHandler::new(
            self.repository.clone(),
            self.esewa_verification.clone(),
            self.mode,
        )
    }

    pub fn esewa_failure_handler(&self) -> ReconcileEsewaFailureHandler {
        ReconcileEsewaFailureHandler::new(self.repository.clone())
    }

    pub fn list_donations_handler(&self) -> ListDonationsHandler {
        ListDonationsHandler::new(self.reader.clone())
    }

    pub fn update_settings_handler(&self) -> UpdatePaymentSettingsHandler {
        UpdatePaymentSettingsHandler::new(self.settings_repository.clone())
    }

    fn success_page(&self, donation_id: &DonationId) -> String {
        format!("{}/donate/success?donation={}", self.site_url, donation_id)
    }

    fn failure_page(&self) -> String {
        format!("{}/donate/failed", self.site_url)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Context
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated administrator extracted from a bearer token.
///
/// The token is minted by the separate admin login flow; this subsystem only
/// consumes the contract: an identity plus a role claim that must be
/// `admin`.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub subject: String,
}

#[derive(Debug, serde::Deserialize)]
struct AdminClaims {
    sub: String,
    role: String,
    #[allow(dead_code)]
    exp: usize,
}

/// Rejection type for AdminUser extraction.
#[derive(Debug)]
pub enum AdminRejection {
    MissingToken,
    InvalidToken,
    NotAdmin,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            AdminRejection::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_REQUIRED",
                "Missing bearer token",
            ),
            AdminRejection::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_REQUIRED",
                "Invalid bearer token",
            ),
            AdminRejection::NotAdmin => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Administrator role required",
            ),
        };
        let body = ErrorResponse::new(code, message);
        (status, Json(body)).into_response()
    }
}

impl axum::extract::FromRequestParts<DonationAppState> for AdminUser {
    type Rejection = AdminRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        state: &'life1 DonationAppState,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let secret = state.admin_jwt_secret.clone();
        Box::pin(async move {
            let token = parts
                .headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or(AdminRejection::MissingToken)?;

            let decoded = jsonwebtoken::decode::<AdminClaims>(
                token,
                &jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
                &jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256),
            )
            .map_err(|_| AdminRejection::InvalidToken)?;

            if decoded.claims.role != "admin" {
                return Err(AdminRejection::NotAdmin);
            }

            Ok(AdminUser {
                subject: decoded.claims.sub,
            })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Donor-Facing Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/donations - Start a donation
pub async fn start_donation(
    State(state): State<DonationAppState>,
    Json(request): Json<StartDonationRequest>,
) -> Result<impl IntoResponse, DonationApiError> {
    let handler = state.start_donation_handler();
    let cmd = StartDonationCommand {
        amount: request.amount,
        donor_name: request.donor_name,
        donor_email: request.donor_email,
        donor_phone: request.donor_phone,
        is_monthly: request.is_monthly,
        provider: request.provider,
    };

    let result = handler.handle(cmd).await?;

    let response = StartDonationResponse {
        ok: true,
        donation_id: result.donation_id.to_string(),
        redirect_url: result.redirect_url,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/donations/options - Payment options for the donation form
pub async fn get_payment_options(
    State(state): State<DonationAppState>,
) -> Result<impl IntoResponse, DonationApiError> {
    let handler = state.payment_options_handler();
    let resolved = handler.handle(GetPaymentOptionsQuery).await?;
    Ok(Json(PaymentOptionsResponse::from(resolved)))
}

/// GET /api/donations/:id - Donation status for the landing pages
pub async fn get_donation(
    State(state): State<DonationAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, DonationApiError> {
    let donation_id: DonationId = id
        .parse()
        .map_err(|_| DonationError::not_found("donation id"))?;

    let handler = state.get_donation_handler();
    let donation = handler
        .handle(GetDonationQuery { donation_id })
        .await?
        .ok_or_else(|| DonationError::not_found("donation id"))?;

    Ok(Json(DonationResponse::from(donation)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Callback / Webhook Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe - Stripe webhook deliveries
pub async fn stripe_webhook(
    State(state): State<DonationAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, DonationApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let handler = state.stripe_webhook_handler();
    let cmd = HandleStripeWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    // Every reconcile outcome is an acknowledgment; only verification and
    // infrastructure failures become error statuses (Stripe retries those).
    handler.handle(cmd).await?;

    Ok((StatusCode::OK, Json(WebhookAckResponse { received: true })))
}

/// POST /api/payments/khalti/verify - Client-invoked Khalti verification
pub async fn verify_khalti_payment(
    State(state): State<DonationAppState>,
    Json(request): Json<KhaltiVerifyRequest>,
) -> Result<impl IntoResponse, DonationApiError> {
    let handler = state.khalti_verify_handler();
    let outcome = handler
        .handle(VerifyKhaltiPaymentCommand { pidx: request.pidx })
        .await?;

    let response = match outcome {
        ReconcileOutcome::Completed(id) => ReconcileResponse {
            ok: true,
            status: "completed",
            donation_id: Some(id.to_string()),
        },
        ReconcileOutcome::AlreadyTerminal(id) => ReconcileResponse {
            ok: true,
            status: "already_processed",
            donation_id: Some(id.to_string()),
        },
        ReconcileOutcome::Failed(id) => ReconcileResponse {
            ok: false,
            status: "failed",
            donation_id: Some(id.to_string()),
        },
        ReconcileOutcome::NotFound | ReconcileOutcome::Ignored(_) => ReconcileResponse {
            ok: false,
            status: "not_found",
            donation_id: None,
        },
    };

    Ok(Json(response))
}

/// GET /api/payments/esewa/success - eSewa success redirect
///
/// eSewa has used both `refId`/`oid` and `rid`/`pid` spellings; both are
/// accepted.
pub async fn esewa_success(
    State(state): State<DonationAppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Redirect {
    let ref_id = params.get("refId").or_else(|| params.get("rid"));
    let product_id = params.get("oid").or_else(|| params.get("pid"));
    let amount = params.get("amt");

    let (Some(ref_id), Some(product_id), Some(amount)) = (ref_id, product_id, amount) else {
        tracing::warn!("eSewa success callback missing required parameters");
        return Redirect::to(&state.failure_page());
    };

    let handler = state.esewa_success_handler();
    let outcome = handler
        .handle(ReconcileEsewaSuccessCommand {
            ref_id: ref_id.clone(),
            product_id: product_id.clone(),
            amount: amount.clone(),
        })
        .await;

    match outcome {
        Ok(ReconcileOutcome::Completed(id)) | Ok(ReconcileOutcome::AlreadyTerminal(id)) => {
            Redirect::to(&state.success_page(&id))
        }
        Ok(_) => Redirect::to(&state.failure_page()),
        Err(e) => {
            tracing::error!(error = %e, "eSewa success reconciliation failed");
            Redirect::to(&state.failure_page())
        }
    }
}

/// GET /api/payments/esewa/failure - eSewa failure redirect
pub async fn esewa_failure(
    State(state): State<DonationAppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Redirect {
    let Some(data) = params.get("data") else {
        tracing::warn!("eSewa failure callback missing data parameter");
        return Redirect::to(&state.failure_page());
    };

    let handler = state.esewa_failure_handler();
    if let Err(e) = handler
        .handle(ReconcileEsewaFailureCommand { data: data.clone() })
        .await
    {
        tracing::warn!(error = %e, "eSewa failure reconciliation errored");
    }

    Redirect::to(&state.failure_page())
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/admin/donations - Recent donations listing (admin only)
pub async fn list_donations(
    State(state): State<DonationAppState>,
    admin: AdminUser,
    Query(params): Query<ListDonationsParams>,
) -> Result<impl IntoResponse, DonationApiError> {
    tracing::debug!(admin = %admin.subject, "Admin donation listing");

    let handler = state.list_donations_handler();
    let result = handler
        .handle(ListDonationsQuery {
            limit: params.limit,
            offset: params.offset,
        })
        .await?;

    let response = DonationListResponse {
        donations: result
            .donations
            .into_iter()
            .map(DonationSummaryResponse::from)
            .collect(),
        total: result.total,
    };

    Ok(Json(response))
}

/// GET /api/admin/payment-settings - Current payment settings (admin only)
pub async fn get_payment_settings(
    State(state): State<DonationAppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, DonationApiError> {
    let settings = state
        .settings_repository
        .load()
        .await
        .map_err(DonationError::from)?
        .unwrap_or_default();

    Ok(Json(PaymentSettingsResponse::from(settings)))
}

/// PUT /api/admin/payment-settings - Replace payment settings (admin only)
pub async fn update_payment_settings(
    State(state): State<DonationAppState>,
    admin: AdminUser,
    Json(request): Json<UpdatePaymentSettingsRequest>,
) -> Result<impl IntoResponse, DonationApiError> {
    tracing::info!(admin = %admin.subject, "Admin payment settings update");

    let handler = state.update_settings_handler();
    let settings = handler
        .handle(UpdatePaymentSettingsCommand {
            enabled_providers: request.enabled_providers,
            primary_provider: request.primary_provider,
            default_currency: request.default_currency,
            allow_recurring: request.allow_recurring,
        })
        .await?;

    Ok(Json(PaymentSettingsResponse::from(settings)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct DonationApiError(DonationError);

impl From<DonationError> for DonationApiError {
    fn from(err: DonationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for DonationApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code) = match &self.0 {
            DonationError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            DonationError::ProviderUnavailable(_) => {
                (StatusCode::BAD_REQUEST, "PROVIDER_UNAVAILABLE")
            }
            DonationError::PaymentInitiationFailed { .. } => {
                (StatusCode::BAD_GATEWAY, "PAYMENT_INITIATION_FAILED")
            }
            DonationError::VerificationFailed { .. } => {
                (StatusCode::BAD_GATEWAY, "VERIFICATION_FAILED")
            }
            DonationError::NotFound { .. } => (StatusCode::NOT_FOUND, "DONATION_NOT_FOUND"),
            DonationError::AlreadyTerminal { .. } => {
                (StatusCode::CONFLICT, "ALREADY_PROCESSED")
            }
            DonationError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = ErrorResponse::new(error_code, self.0.message());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::esewa::{EsewaGateway, EsewaGatewayConfig};
    use crate::adapters::khalti::{KhaltiGateway, KhaltiGatewayConfig};
    use crate::adapters::stripe::{StripeGateway, StripeGatewayConfig};
    use crate::application::handlers::donation::testing::{
        InMemoryDonationRepository, InMemorySettingsRepository,
    };
    use crate::domain::donation::{DonationStatus, Provider};
    use crate::ports::DonationSummary;
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    struct EmptyReader;

    #[async_trait]
    impl DonationReader for EmptyReader {
        async fn list_recent(
            &self,
            _limit: i64,
            _offset: i64,
        ) -> Result<Vec<DonationSummary>, crate::domain::foundation::DomainError> {
            Ok(vec![])
        }

        async fn count(&self) -> Result<i64, crate::domain::foundation::DomainError> {
            Ok(0)
        }
    }

    const TEST_JWT_SECRET: &str = "test-secret-test-secret-test-secret!";
    const SITE_URL: &str = "https://sahayog.org";
    const API_URL: &str = "https://api.sahayog.org";

    /// Full mock-mode state: real gateway adapters, in-memory persistence.
    fn mock_state(repository: Arc<InMemoryDonationRepository>) -> DonationAppState {
        let stripe = Arc::new(StripeGateway::new(StripeGatewayConfig::new(
            None,
            PaymentMode::Mock,
            format!("{}/donate/success", SITE_URL),
            format!("{}/donate/cancelled", SITE_URL),
        )));
        let khalti = Arc::new(KhaltiGateway::new(KhaltiGatewayConfig {
            credentials: None,
            mode: PaymentMode::Mock,
            return_url: format!("{}/donate/khalti/return", SITE_URL),
            website_url: SITE_URL.to_string(),
        }));
        let esewa = Arc::new(EsewaGateway::new(EsewaGatewayConfig {
            credentials: None,
            mode: PaymentMode::Mock,
            success_callback_url: format!("{}/api/payments/esewa/success", API_URL),
            failure_callback_url: format!("{}/api/payments/esewa/failure", API_URL),
        }));

        let mut registry = GatewayRegistry::new();
        registry.register(stripe.clone());
        registry.register(khalti.clone());
        registry.register(esewa.clone());

        DonationAppState {
            repository,
            reader: Arc::new(EmptyReader),
            settings_repository: Arc::new(InMemorySettingsRepository::new()),
            registry,
            stripe_events: stripe,
            khalti_lookup: khalti,
            esewa_verification: esewa,
            mode: PaymentMode::Mock,
            configured: ConfiguredProviders::default(),
            admin_jwt_secret: TEST_JWT_SECRET.to_string(),
            site_url: SITE_URL.to_string(),
        }
    }

    fn admin_token(role: &str) -> String {
        #[derive(serde::Serialize)]
        struct Claims<'a> {
            sub: &'a str,
            role: &'a str,
            exp: usize,
        }
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &Claims {
                sub: "admin-1",
                role,
                exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            },
            &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn start_request(provider: Provider) -> StartDonationRequest {
        StartDonationRequest {
            amount: Decimal::new(2500, 2),
            donor_name: "Asha Tamang".to_string(),
            donor_email: "asha@example.org".to_string(),
            donor_phone: None,
            is_monthly: false,
            provider,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Flow Tests (mock mode, end to end through the handlers)
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn esewa_mock_flow_completes_through_the_callback() {
        let repository = Arc::new(InMemoryDonationRepository::new());
        let state = mock_state(repository.clone());

        // 1. Start the donation.
        let response = start_donation(
            State(state.clone()),
            Json(start_request(Provider::Esewa)),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        // 2. The mock gateway redirected straight to our success callback;
        //    replay those query parameters against the callback handler.
        assert_eq!(repository.len(), 1);
        let donation = repository
            .find_latest_by_id_prefix("")
            .await
            .unwrap()
            .unwrap();
        let reference = donation.payment_reference.clone().unwrap();
        let mut params = HashMap::new();
        params.insert("oid".to_string(), reference);
        params.insert("amt".to_string(), "25".to_string());
        params.insert("refId".to_string(), "MOCKREF1".to_string());

        let redirect = esewa_success(State(state.clone()), Query(params)).await;
        let response = redirect.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        // 3. The donation is now completed with the provider reference.
        let stored = repository.get(&donation.id).unwrap();
        assert_eq!(stored.status, DonationStatus::Completed);
        assert_eq!(stored.payment_reference.as_deref(), Some("esewa:MOCKREF1"));
    }

    #[tokio::test]
    async fn stripe_mock_webhook_completes_donation() {
        let repository = Arc::new(InMemoryDonationRepository::new());
        let state = mock_state(repository.clone());

        let response = start_donation(
            State(state.clone()),
            Json(start_request(Provider::Stripe)),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let donation = repository
            .find_latest_by_id_prefix("")
            .await
            .unwrap()
            .unwrap();

        let payload = serde_json::json!({
            "id": "evt_mock_1",
            "type": "checkout.session.completed",
            "data": {"object": {
                "id": "cs_mock_1",
                "client_reference_id": donation.id.to_string(),
                "amount_total": 2500,
                "currency": "usd"
            }}
        })
        .to_string();

        // Mock mode: no signature header needed.
        let result = stripe_webhook(
            State(state),
            axum::http::HeaderMap::new(),
            axum::body::Bytes::from(payload),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(result.status(), StatusCode::OK);
        assert_eq!(
            repository.get(&donation.id).unwrap().status,
            DonationStatus::Completed
        );
    }

    #[tokio::test]
    async fn khalti_mock_verify_completes_donation() {
        let repository = Arc::new(InMemoryDonationRepository::new());
        let state = mock_state(repository.clone());

        start_donation(State(state.clone()), Json(start_request(Provider::Khalti)))
            .await
            .unwrap();

        let donation = repository
            .find_latest_by_id_prefix("")
            .await
            .unwrap()
            .unwrap();
        let pidx = donation
            .payment_reference
            .as_deref()
            .unwrap()
            .strip_prefix("khalti:")
            .unwrap()
            .to_string();

        let response = verify_khalti_payment(State(state), Json(KhaltiVerifyRequest { pidx }))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            repository.get(&donation.id).unwrap().status,
            DonationStatus::Completed
        );
    }

    #[tokio::test]
    async fn esewa_callback_with_missing_params_redirects_to_failure_page() {
        let state = mock_state(Arc::new(InMemoryDonationRepository::new()));

        let redirect = esewa_success(State(state), Query(HashMap::new())).await;
        let response = redirect.into_response();

        let location = response
            .headers()
            .get(axum::http::header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(location, "https://sahayog.org/donate/failed");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Admin Auth Tests
    // ════════════════════════════════════════════════════════════════════════════

    async fn extract_admin(
        state: &DonationAppState,
        authorization: Option<&str>,
    ) -> Result<AdminUser, AdminRejection> {
        use axum::extract::FromRequestParts;

        let mut builder = axum::http::Request::builder().uri("/api/admin/donations");
        if let Some(authorization) = authorization {
            builder = builder.header(axum::http::header::AUTHORIZATION, authorization);
        }
        let request = builder.body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        AdminUser::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn admin_extractor_accepts_admin_token() {
        let state = mock_state(Arc::new(InMemoryDonationRepository::new()));
        let token = admin_token("admin");

        let admin = extract_admin(&state, Some(&format!("Bearer {}", token)))
            .await
            .unwrap();
        assert_eq!(admin.subject, "admin-1");
    }

    #[tokio::test]
    async fn admin_extractor_rejects_missing_token() {
        let state = mock_state(Arc::new(InMemoryDonationRepository::new()));
        assert!(matches!(
            extract_admin(&state, None).await,
            Err(AdminRejection::MissingToken)
        ));
    }

    #[tokio::test]
    async fn admin_extractor_rejects_non_admin_role() {
        let state = mock_state(Arc::new(InMemoryDonationRepository::new()));
        let token = admin_token("editor");

        assert!(matches!(
            extract_admin(&state, Some(&format!("Bearer {}", token))).await,
            Err(AdminRejection::NotAdmin)
        ));
    }

    #[tokio::test]
    async fn admin_extractor_rejects_garbage_token() {
        let state = mock_state(Arc::new(InMemoryDonationRepository::new()));
        assert!(matches!(
            extract_admin(&state, Some("Bearer not.a.jwt")).await,
            Err(AdminRejection::InvalidToken)
        ));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn api_error_maps_validation_to_400() {
        let err = DonationApiError(DonationError::validation("amount", "must be positive"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_maps_provider_unavailable_to_400() {
        let err = DonationApiError(DonationError::provider_unavailable(Provider::Khalti));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_maps_initiation_failure_to_502() {
        let err = DonationApiError(DonationError::initiation_failed("gateway down"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn api_error_maps_verification_failure_to_502() {
        let err = DonationApiError(DonationError::verification_failed("timeout"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn api_error_maps_not_found_to_404() {
        let err = DonationApiError(DonationError::not_found("reference"));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_error_maps_infrastructure_to_500() {
        let err = DonationApiError(DonationError::infrastructure("db down"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
