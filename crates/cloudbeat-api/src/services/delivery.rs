use crate::auth::AuthContext;
use crate::services::catalog::SONG_NOT_FOUND;
use crate::state::AppState;
use cloudbeat_core::AppError;
use cloudbeat_storage::SignedUrlResponse;
use std::time::Duration;

/// Issues time-limited retrieval URLs for catalog entries.
pub struct DeliveryService<'a> {
    state: &'a AppState,
}

impl<'a> DeliveryService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    #[tracing::instrument(skip(self, auth), fields(user_id = %auth.user_id, operation = "signed_url"))]
    pub async fn signed_url(&self, auth: &AuthContext, song_id: &str) -> Result<String, AppError> {
        let credential = auth.credential();

        let song = self
            .state
            .catalog
            .songs
            .find(song_id, &credential)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(SONG_NOT_FOUND.to_string()))?;

        let ttl = Duration::from_secs(self.state.config.signed_url_ttl_secs);
        let response = self
            .state
            .storage
            .blobs
            .create_signed_url(&song.storage_key, ttl, &credential)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, storage_key = %song.storage_key, "Signing request failed");
                AppError::Upstream(e.to_string())
            })?;

        match response {
            SignedUrlResponse::Url(url) => Ok(url),
            SignedUrlResponse::Upstream(message) => {
                tracing::warn!(storage_key = %song.storage_key, error = %message, "Storage refused to sign URL");
                Err(AppError::Upstream(message))
            }
            SignedUrlResponse::Malformed(value) => {
                tracing::error!(storage_key = %song.storage_key, response = %value, "Unrecognized signed URL response");
                Err(AppError::Upstream(format!(
                    "Unrecognized signed URL response: {}",
                    value
                )))
            }
        }
    }
}
