//! Depot API Server
//!
//! Main entry point for the Depot file storage service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use depot_api::{AppState, create_router};
use depot_core::storage::{StorageConfig, select};
use depot_db::connect_with;
use depot_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "depot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;
    info!(run_mode = %config.run_mode, "Configuration loaded");

    // Connect to database
    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    // Select the storage backend once for the life of the process
    let storage = StorageConfig::from_settings(&config.storage, &config.run_mode)
        .context("invalid storage configuration")?;
    let backend = select(&storage).context("failed to initialize storage backend")?;

    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));

    let state = AppState::new(db, jwt_service, backend, storage);
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
