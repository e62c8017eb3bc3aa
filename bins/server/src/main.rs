//! Guardbook API Server
//!
//! Main entry point for the ledger and reconciliation service.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use guardbook_api::{AppState, create_router};
use guardbook_core::LedgerEngine;
use guardbook_db::{PgLedgerStore, connect_with};
use guardbook_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "guardbook=debug,tower_http=debug".into());
    if config.log.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let db = connect_with(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let engine = LedgerEngine::new(PgLedgerStore::new(db), config.ledger.clone());
    info!(
        currency = %config.ledger.currency,
        timezone = %config.ledger.timezone,
        "Ledger engine configured"
    );

    let state = AppState::new(engine, JwtService::new(&config.jwt));
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
