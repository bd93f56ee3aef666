//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, FileAdapter},
    config::{Config, StorageConfig},
    error::ApiError,
    web::{build_router, cors_layer, state::AppState},
};
use job_tracker_core::ports::DatabaseService;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Storage Backend ---
    let db: Arc<dyn DatabaseService> = match &config.storage {
        StorageConfig::Postgres {
            database_url,
            ssl,
            max_connections,
        } => {
            info!("Connecting to database (ssl: {:?})...", ssl);
            let adapter = DbAdapter::connect(database_url, *ssl, *max_connections).await?;
            info!("Running database migrations...");
            adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(adapter)
        }
        StorageConfig::File { path } => {
            info!("Using flat-file storage at {}", path.display());
            Arc::new(FileAdapter::open(path.clone()).await?)
        }
    };

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState { db });

    // --- 4. Create the Web Router ---
    let cors = config
        .cors_origin
        .as_deref()
        .map(cors_layer)
        .transpose()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let app = build_router(app_state, &config.static_root, cors);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Serving static files from {}, Swagger UI at http://{}/swagger-ui",
        config.static_root.display(),
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
