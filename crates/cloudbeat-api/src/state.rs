//! Application state shared by every handler.
//!
//! Built once in `setup::services` and handed to the router as `Arc<AppState>`.
//! Collaborators are trait objects so tests can substitute in-memory ones.

use crate::auth::verifier::TokenVerifier;
use cloudbeat_core::Config;
use cloudbeat_db::{PlaylistRepository, SongRepository};
use cloudbeat_processing::AudioProber;
use cloudbeat_storage::{BlobStore, LocalBlobStore};
use std::sync::Arc;

/// Catalog repositories.
#[derive(Clone)]
pub struct CatalogState {
    pub songs: Arc<dyn SongRepository>,
    pub playlists: Arc<dyn PlaylistRepository>,
}

/// Blob storage, plus the local store when the gateway serves files itself.
#[derive(Clone)]
pub struct StorageState {
    pub blobs: Arc<dyn BlobStore>,
    pub local: Option<Arc<LocalBlobStore>>,
}

pub struct AppState {
    pub config: Config,
    pub catalog: CatalogState,
    pub storage: StorageState,
    pub verifier: Arc<dyn TokenVerifier>,
    pub prober: AudioProber,
}
