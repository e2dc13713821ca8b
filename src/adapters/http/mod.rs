//! HTTP adapters - REST API implementations.

pub mod donation;

pub use donation::donation_router;
pub use donation::DonationAppState;

use axum::routing::get;
use axum::Router;

/// Builds the full application router: API routes plus liveness probe.
pub fn app_router(state: DonationAppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .nest("/api", donation_router())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
