//! Collaborator construction and application state setup

use crate::auth::jwks::JwksVerifier;
use crate::auth::{SharedSecretVerifier, TokenVerifier, UnverifiedDecoder};
use crate::state::{AppState, CatalogState, StorageState};
use anyhow::{Context, Result};
use cloudbeat_core::{Config, TokenVerificationMode};
use cloudbeat_db::create_repositories;
use cloudbeat_processing::AudioProber;
use cloudbeat_storage::create_blob_store;
use std::sync::Arc;
use std::time::Duration;

/// Shared HTTP client for the data platform; cloned into every collaborator.
pub fn http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

pub fn token_verifier(config: &Config, http: reqwest::Client) -> Result<Arc<dyn TokenVerifier>> {
    let verifier: Arc<dyn TokenVerifier> = match config.jwt_verification {
        TokenVerificationMode::None => {
            tracing::warn!("Bearer token signatures are not verified by the gateway");
            Arc::new(UnverifiedDecoder)
        }
        TokenVerificationMode::Hs256 => {
            let secret = config
                .jwt_secret
                .as_deref()
                .context("JWT_SECRET is required for hs256 verification")?;
            Arc::new(SharedSecretVerifier::new(secret))
        }
        TokenVerificationMode::Jwks => {
            let url = config
                .jwks_url
                .clone()
                .context("JWKS_URL is required for jwks verification")?;
            Arc::new(JwksVerifier::new(http, url, None))
        }
    };
    Ok(verifier)
}

/// Initialize all collaborators, returning the application state
pub async fn initialize_services(config: Config) -> Result<Arc<AppState>> {
    let http = http_client(&config)?;

    let repositories =
        create_repositories(&config, http.clone()).context("Failed to create repositories")?;
    let blob_store = create_blob_store(&config, http.clone())
        .await
        .context("Failed to create blob store")?;
    tracing::info!(
        backend = %blob_store.store.backend_type(),
        bucket = %config.storage_bucket,
        "Blob store initialized"
    );

    let verifier = token_verifier(&config, http)?;
    let prober = AudioProber::new(config.ffprobe_path.clone());

    Ok(Arc::new(AppState {
        catalog: CatalogState {
            songs: repositories.songs,
            playlists: repositories.playlists,
        },
        storage: StorageState {
            blobs: blob_store.store,
            local: blob_store.local,
        },
        verifier,
        prober,
        config,
    }))
}
