//! Examiner payroll server.
//!
//! Loads configuration from `PAYROLL_CONFIG_DIR` (default
//! `./config/default`) and serves the API over an in-memory store.

use std::sync::Arc;

use examiner_payroll::api::{AppState, create_router};
use examiner_payroll::config::ConfigLoader;
use examiner_payroll::store::InMemoryStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_DIR: &str = "./config/default";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_dir =
        std::env::var("PAYROLL_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let config = ConfigLoader::load(&config_dir)?;
    let examiners = ConfigLoader::load_examiners(&config_dir)?;
    let bind_address = config.service().server.bind_address.clone();

    info!(
        config_dir = %config_dir,
        examiners = examiners.len(),
        per_paper_rate = %config.rates().per_paper_rate,
        "Loaded configuration"
    );

    let store = Arc::new(InMemoryStore::with_examiners(examiners));
    let state = AppState::new(config, store)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "Examiner payroll server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
