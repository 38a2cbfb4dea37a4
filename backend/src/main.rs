//! Shop Dashboard - Backend Server
//!
//! Product pricing, inventory stock ledger and business context for
//! small shops.

use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopdash_backend::{
    config::{Config, StorageBackend},
    create_app,
    store::Stores,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shopdash_server=debug,shopdash_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load().context("failed to load configuration")?;

    tracing::info!("Starting Shop Dashboard Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Negative stock policy: {:?}", config.ledger.negative_stock);

    let stores = match config.storage.backend {
        StorageBackend::Postgres => {
            if config.database.url.is_empty() {
                anyhow::bail!("database.url must be set when storage.backend is postgres");
            }

            // Create database connection pool
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
                .connect(&config.database.url)
                .await
                .context("failed to connect to database")?;

            tracing::info!("Database connection established");

            // Run migrations in development
            if config.is_development() {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            Stores::postgres(db_pool)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Stores::memory()
        }
    };

    if config.assistant.is_none() {
        tracing::info!("Assistant endpoint not configured; chat is disabled");
    }

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .context("server.host is not a valid IP address")?;
    let addr = SocketAddr::new(host, config.server.port);

    // Create application state
    let state = AppState::new(stores, config)?;

    // Build application
    let app = create_app(state);

    // Start server
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
