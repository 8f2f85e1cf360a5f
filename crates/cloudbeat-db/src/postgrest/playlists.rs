use async_trait::async_trait;
use cloudbeat_core::constants::{PLAYLISTS_TABLE, PLAYLIST_SONGS_TABLE};
use cloudbeat_core::models::PlaylistEmbedRow;
use cloudbeat_core::{Credential, Playlist, PlaylistSong, PlaylistWithSongs};
use reqwest::Method;
use serde_json::json;

use super::{eq, PostgrestClient};
use crate::error::DbResult;
use crate::traits::PlaylistRepository;

#[derive(Clone)]
pub struct PostgrestPlaylistRepository {
    client: PostgrestClient,
}

impl PostgrestPlaylistRepository {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PlaylistRepository for PostgrestPlaylistRepository {
    #[tracing::instrument(skip(self, credential), fields(db.table = "playlists", db.operation = "select"))]
    async fn list(&self, credential: &Credential) -> DbResult<Vec<Playlist>> {
        let request = self
            .client
            .request(Method::GET, PLAYLISTS_TABLE, credential)
            .query(&[("select", "*")]);
        self.client.fetch(request, PLAYLISTS_TABLE).await
    }

    #[tracing::instrument(skip(self, credential), fields(db.table = "playlists", db.operation = "insert"))]
    async fn create(&self, name: &str, credential: &Credential) -> DbResult<Vec<Playlist>> {
        let request = self
            .client
            .request(Method::POST, PLAYLISTS_TABLE, credential)
            .header("Prefer", "return=representation")
            .json(&json!({ "name": name }));
        self.client.fetch(request, PLAYLISTS_TABLE).await
    }

    #[tracing::instrument(skip(self, credential), fields(db.table = "playlists", db.operation = "select", db.record_id = %id))]
    async fn get_with_songs(
        &self,
        id: &str,
        credential: &Credential,
    ) -> DbResult<Vec<PlaylistWithSongs>> {
        let request = self
            .client
            .request(Method::GET, PLAYLISTS_TABLE, credential)
            .query(&[
                ("select", "*,playlist_songs(song:songs(*))".to_string()),
                ("id", eq(id)),
            ]);
        let rows: Vec<PlaylistEmbedRow> = self.client.fetch(request, PLAYLISTS_TABLE).await?;
        Ok(rows.into_iter().map(PlaylistWithSongs::from).collect())
    }

    #[tracing::instrument(skip(self, credential), fields(db.table = "playlist_songs", db.operation = "insert"))]
    async fn add_song(
        &self,
        playlist_id: &str,
        song_id: &str,
        credential: &Credential,
    ) -> DbResult<Vec<PlaylistSong>> {
        let request = self
            .client
            .request(Method::POST, PLAYLIST_SONGS_TABLE, credential)
            .header("Prefer", "return=representation")
            .json(&json!({ "playlist_id": playlist_id, "song_id": song_id }));
        self.client.fetch(request, PLAYLIST_SONGS_TABLE).await
    }
}
