//! Sahayog backend server entrypoint.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use sahayog::adapters::esewa::{EsewaGateway, EsewaGatewayConfig};
use sahayog::adapters::http::{app_router, DonationAppState};
use sahayog::adapters::khalti::{KhaltiGateway, KhaltiGatewayConfig};
use sahayog::adapters::postgres::{
    PostgresDonationReader, PostgresDonationRepository, PostgresSettingsRepository,
};
use sahayog::adapters::stripe::{StripeGateway, StripeGatewayConfig};
use sahayog::config::AppConfig;
use sahayog::ports::GatewayRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    tracing::info!(
        mode = ?config.payment.mode,
        environment = ?config.server.environment,
        "Starting sahayog backend"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let site_url = config.server.site_url.clone();
    let public_url = config.server.public_url.clone();
    let mode = config.payment.mode;

    let stripe = Arc::new(StripeGateway::new(StripeGatewayConfig::new(
        config.payment.stripe.clone(),
        mode,
        format!("{}/donate/success", site_url),
        format!("{}/donate/cancelled", site_url),
    )));
    let khalti = Arc::new(KhaltiGateway::new(KhaltiGatewayConfig {
        credentials: config.payment.khalti.clone(),
        mode,
        return_url: format!("{}/donate/khalti/return", site_url),
        website_url: site_url.clone(),
    }));
    let esewa = Arc::new(EsewaGateway::new(EsewaGatewayConfig {
        credentials: config.payment.esewa.clone(),
        mode,
        success_callback_url: format!("{}/api/payments/esewa/success", public_url),
        failure_callback_url: format!("{}/api/payments/esewa/failure", public_url),
    }));

    let mut registry = GatewayRegistry::new();
    registry.register(stripe.clone());
    registry.register(khalti.clone());
    registry.register(esewa.clone());

    let state = DonationAppState {
        repository: Arc::new(PostgresDonationRepository::new(pool.clone())),
        reader: Arc::new(PostgresDonationReader::new(pool.clone())),
        settings_repository: Arc::new(PostgresSettingsRepository::new(pool)),
        registry,
        stripe_events: stripe,
        khalti_lookup: khalti,
        esewa_verification: esewa,
        mode,
        configured: config.payment.configured_providers(),
        admin_jwt_secret: config.auth.admin_jwt_secret.clone(),
        site_url,
    };

    let cors = match config.server.cors_origins_list().as_slice() {
        [] => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        origins => {
            let origins: Vec<http::HeaderValue> = origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    let app = app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
