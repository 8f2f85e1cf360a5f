//! Upload pipeline: buffer, probe, store, record.
//!
//! Every collaborator call carries the caller's own credential, so the platform's
//! storage and row policies decide whether the upload is allowed.

pub mod multipart;
pub mod temp_asset;

use crate::auth::AuthContext;
use crate::state::AppState;
use axum::extract::Multipart;
use cloudbeat_core::{AppError, CatalogEntry, NewCatalogEntry};
use cloudbeat_storage::{allocate_storage_key, now_timestamp};
use multipart::{read_upload_form, UploadForm};
use std::time::Instant;

pub use temp_asset::TempAsset;

pub struct IngestService<'a> {
    state: &'a AppState,
}

impl<'a> IngestService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Ingest one uploaded song for the caller.
    ///
    /// The temporary buffer is removed before this returns, whatever the outcome.
    #[tracing::instrument(skip(self, auth, multipart), fields(user_id = %auth.user_id, operation = "ingest_song"))]
    pub async fn ingest(
        &self,
        auth: &AuthContext,
        multipart: Multipart,
    ) -> Result<CatalogEntry, AppError> {
        let config = &self.state.config;
        let form = read_upload_form(
            multipart,
            config.upload_temp_dir.as_deref(),
            config.max_upload_size_bytes,
        )
        .await?;

        let UploadForm {
            asset,
            filename,
            content_type,
            title,
            artist,
            album,
        } = form;

        let result = self
            .store_and_record(
                auth,
                &asset,
                &filename,
                &content_type,
                title.as_deref(),
                artist.as_deref(),
                album.as_deref(),
            )
            .await;
        asset.close();
        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn store_and_record(
        &self,
        auth: &AuthContext,
        asset: &TempAsset,
        filename: &str,
        content_type: &str,
        title: Option<&str>,
        artist: Option<&str>,
        album: Option<&str>,
    ) -> Result<CatalogEntry, AppError> {
        let start = Instant::now();
        let credential = auth.credential();

        let duration = self.state.prober.probe_duration(asset.path()).await;
        let storage_key = allocate_storage_key(&auth.user_id, filename, now_timestamp());

        let reader = asset.reader().await?;
        if let Err(e) = self
            .state
            .storage
            .blobs
            .upload(
                &storage_key,
                reader,
                Some(asset.len()),
                content_type,
                &credential,
            )
            .await
        {
            tracing::error!(error = %e, storage_key = %storage_key, "Blob upload failed");
            return Err(AppError::StorageWriteFailed(e.to_string()));
        }

        let entry = NewCatalogEntry::new(
            auth.user_id.as_str(),
            storage_key.as_str(),
            filename,
            title,
            artist,
            album,
            duration,
            content_type,
        );

        let song = self
            .state
            .catalog
            .songs
            .insert(&entry, &credential)
            .await
            .map_err(|e| {
                // The blob stays in place; reconciliation works from this log line.
                tracing::warn!(
                    error = %e,
                    orphaned_storage_key = %storage_key,
                    "Catalog insert failed after upload"
                );
                AppError::Upstream(e.to_string())
            })?;

        tracing::info!(
            song_id = %song.id,
            storage_key = %song.storage_key,
            size_bytes = asset.len(),
            duration = %song.duration,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Song ingested"
        );
        Ok(song)
    }
}
