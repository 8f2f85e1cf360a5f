use crate::{BlobStore, LocalBlobStore, StorageBackend, StorageError, StorageResult, SupabaseBlobStore};
use cloudbeat_core::Config;
use std::sync::Arc;

/// The configured blob store, plus the concrete local store when that backend is
/// selected (the gateway serves its signed URLs itself).
#[derive(Clone)]
pub struct ConfiguredBlobStore {
    pub store: Arc<dyn BlobStore>,
    pub local: Option<Arc<LocalBlobStore>>,
}

/// Create a blob store based on configuration
pub async fn create_blob_store(
    config: &Config,
    http: reqwest::Client,
) -> StorageResult<ConfiguredBlobStore> {
    match config.storage_backend {
        StorageBackend::Supabase => {
            let project_url = config.supabase_url.as_deref().ok_or_else(|| {
                StorageError::ConfigError("SUPABASE_URL not configured".to_string())
            })?;
            let api_key = config.supabase_key.clone().ok_or_else(|| {
                StorageError::ConfigError("SUPABASE_KEY not configured".to_string())
            })?;

            let store = SupabaseBlobStore::new(
                http,
                project_url,
                api_key,
                config.storage_bucket.clone(),
            );
            Ok(ConfiguredBlobStore {
                store: Arc::new(store),
                local: None,
            })
        }

        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;
            let secret = config.signed_url_secret.clone().ok_or_else(|| {
                StorageError::ConfigError("SIGNED_URL_SECRET not configured".to_string())
            })?;

            let store = Arc::new(
                LocalBlobStore::new(base_path, &config.storage_bucket, base_url, secret).await?,
            );
            Ok(ConfiguredBlobStore {
                store: store.clone(),
                local: Some(store),
            })
        }
    }
}
