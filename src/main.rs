use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use harvest_hub::config::{AppConfig, DEFAULT_ADMIN_TOKEN};
use harvest_hub::db;
use harvest_hub::handlers;
use harvest_hub::services::phone;
use harvest_hub::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    if config.admin_token == DEFAULT_ADMIN_TOKEN {
        tracing::warn!("ADMIN_TOKEN not set, using the default token");
    }

    let conn = db::init_db(&config.database_url)?;
    tracing::info!("database ready at {}", config.database_url);

    let phone_verifier = phone::from_config(&config);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        phone_verifier,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
