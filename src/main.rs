use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_core::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    error::init_error_reporting,
    routes::build_app,
    services::identity_service::RemoteTokenVerifier,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    init_error_reporting(config.is_production());
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let verifier = RemoteTokenVerifier::new(
        &config.auth_issuer_url,
        &config.auth_api_key,
        config.auth_verify_timeout,
    )?;

    let state = AppState {
        orm,
        verifier: Arc::new(verifier),
        shipping_fee: config.shipping_fee,
    };
    let app = build_app(state);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!(environment = %config.environment, "listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
