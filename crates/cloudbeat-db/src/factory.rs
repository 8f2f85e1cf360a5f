use cloudbeat_core::{Config, DatabaseBackend};
use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::memory::{InMemoryPlaylistRepository, InMemorySongRepository};
use crate::postgrest::{PostgrestClient, PostgrestPlaylistRepository, PostgrestSongRepository};
use crate::traits::{PlaylistRepository, SongRepository};

#[derive(Clone)]
pub struct Repositories {
    pub songs: Arc<dyn SongRepository>,
    pub playlists: Arc<dyn PlaylistRepository>,
}

/// Create the catalog repositories based on configuration
pub fn create_repositories(config: &Config, http: reqwest::Client) -> DbResult<Repositories> {
    match config.database_backend {
        DatabaseBackend::Postgrest => {
            let project_url = config
                .supabase_url
                .as_deref()
                .ok_or_else(|| DbError::Config("SUPABASE_URL not configured".to_string()))?;
            let api_key = config
                .supabase_key
                .clone()
                .ok_or_else(|| DbError::Config("SUPABASE_KEY not configured".to_string()))?;

            let client = PostgrestClient::new(http, project_url, api_key);
            Ok(Repositories {
                songs: Arc::new(PostgrestSongRepository::new(client.clone())),
                playlists: Arc::new(PostgrestPlaylistRepository::new(client)),
            })
        }
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory catalog; data is lost on restart");
            let songs = InMemorySongRepository::new();
            Ok(Repositories {
                songs: Arc::new(songs.clone()),
                playlists: Arc::new(InMemoryPlaylistRepository::new(songs)),
            })
        }
    }
}
