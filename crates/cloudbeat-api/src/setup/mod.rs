//! Application setup and initialization
//!
//! Everything main.rs needs to go from a [`Config`] to a running router.

pub mod health;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use cloudbeat_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_tracing();

    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;
    tracing::info!(
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        database_backend = %config.database_backend,
        jwt_verification = %config.jwt_verification,
        "Configuration loaded and validated successfully"
    );

    let state = services::initialize_services(config).await?;
    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}
