//! Test helpers: build AppState and router for integration tests.
//!
//! The catalog is the in-memory repository pair and blobs live in a local store
//! under a temp directory, so no external service is needed.
//! Run from workspace root: `cargo test -p cloudbeat-api`.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;
pub mod storage;

use axum_test::TestServer;
use cloudbeat_api::auth::{TokenVerifier, UnverifiedDecoder};
use cloudbeat_api::setup::routes;
use cloudbeat_api::state::{AppState, CatalogState, StorageState};
use cloudbeat_core::{Config, DatabaseBackend, StorageBackend, TokenVerificationMode};
use cloudbeat_db::{InMemoryPlaylistRepository, InMemorySongRepository, SongRepository};
use cloudbeat_processing::AudioProber;
use cloudbeat_storage::{BlobStore, LocalBlobStore};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const BASE_URL: &str = "http://localhost:5000";
pub const SIGNING_SECRET: &str = "test-signed-url-secret-0123456789abcdef";

/// Test application: server plus handles on the in-memory collaborators.
pub struct TestApp {
    pub server: TestServer,
    pub songs: InMemorySongRepository,
    pub state: Arc<AppState>,
    pub temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Directory holding the local bucket.
    pub fn bucket_dir(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("blobs").join("music")
    }

    /// Directory used for upload buffers.
    pub fn upload_dir(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("uploads")
    }
}

pub fn create_test_config(root: &Path) -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        supabase_url: None,
        supabase_key: None,
        storage_backend: StorageBackend::Local,
        database_backend: DatabaseBackend::Memory,
        storage_bucket: "music".to_string(),
        signed_url_ttl_secs: 3600,
        http_timeout_secs: 5,
        local_storage_path: Some(root.join("blobs").to_string_lossy().to_string()),
        local_storage_base_url: Some(BASE_URL.to_string()),
        signed_url_secret: Some(SIGNING_SECRET.to_string()),
        max_upload_size_bytes: 2 * 1024 * 1024,
        upload_temp_dir: Some(root.join("uploads")),
        ffprobe_path: None,
        jwt_verification: TokenVerificationMode::None,
        jwt_secret: None,
        jwks_url: None,
    }
}

async fn build(
    blobs: Option<Arc<dyn BlobStore>>,
    catalog_songs: Option<Arc<dyn SongRepository>>,
    verifier: Arc<dyn TokenVerifier>,
    configure: impl FnOnce(&mut Config),
) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let mut config = create_test_config(temp_dir.path());
    configure(&mut config);
    std::fs::create_dir_all(temp_dir.path().join("uploads")).expect("Failed to create upload dir");

    let local = Arc::new(
        LocalBlobStore::new(
            temp_dir.path().join("blobs"),
            &config.storage_bucket,
            BASE_URL.to_string(),
            SIGNING_SECRET,
        )
        .await
        .expect("Failed to create local storage"),
    );
    let blobs = blobs.unwrap_or_else(|| local.clone() as Arc<dyn BlobStore>);

    let songs = InMemorySongRepository::new();
    let playlists = InMemoryPlaylistRepository::new(songs.clone());

    let state = Arc::new(AppState {
        catalog: CatalogState {
            songs: catalog_songs.unwrap_or_else(|| Arc::new(songs.clone())),
            playlists: Arc::new(playlists),
        },
        storage: StorageState {
            blobs,
            local: Some(local),
        },
        verifier,
        prober: AudioProber::new(None),
        config,
    });

    let app = routes::setup_routes(state.clone()).expect("Failed to build router");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        songs,
        state,
        temp_dir,
    }
}

/// Setup test app with in-memory catalog and local blob storage.
pub async fn setup_test_app() -> TestApp {
    build(None, None, Arc::new(UnverifiedDecoder), |_| {}).await
}

/// Setup test app with a substitute blob store.
pub async fn setup_test_app_with_blobs(blobs: Arc<dyn BlobStore>) -> TestApp {
    build(Some(blobs), None, Arc::new(UnverifiedDecoder), |_| {}).await
}

/// Setup test app whose handlers see `songs` instead of the in-memory catalog.
///
/// `TestApp::songs` still points at a fresh in-memory repository.
pub async fn setup_test_app_with_songs(songs: Arc<dyn SongRepository>) -> TestApp {
    build(None, Some(songs), Arc::new(UnverifiedDecoder), |_| {}).await
}

pub async fn setup_test_app_with_verifier(verifier: Arc<dyn TokenVerifier>) -> TestApp {
    build(None, None, verifier, |_| {}).await
}

pub async fn setup_test_app_with_config(configure: impl FnOnce(&mut Config)) -> TestApp {
    build(None, None, Arc::new(UnverifiedDecoder), configure).await
}

/// Number of files left in the upload buffer directory.
pub fn leftover_uploads(app: &TestApp) -> usize {
    std::fs::read_dir(app.upload_dir())
        .map(|entries| entries.count())
        .unwrap_or(0)
}
