use anyhow::Context;
use hopekcc_common::storage;
use hopekcc_server::config::AppConfig;
use hopekcc_server::database::init_db;
use hopekcc_server::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database)
        .await
        .context("Failed to initialize database")?;

    let blob_store = storage::open(&config.storage)
        .await
        .context("Failed to open blob store")?;
    info!(backend = ?config.storage.backend, "Blob store ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, db, blob_store);
    let app = hopekcc_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{addr}");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
