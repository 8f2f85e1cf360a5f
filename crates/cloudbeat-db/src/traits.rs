use async_trait::async_trait;
use cloudbeat_core::{
    CatalogEntry, Credential, NewCatalogEntry, Playlist, PlaylistSong, PlaylistWithSongs,
};

use crate::error::DbResult;

/// Access to the `songs` table.
///
/// Visibility is decided by the store: with `Credential::Caller` only the
/// caller's rows exist as far as these methods are concerned.
#[async_trait]
pub trait SongRepository: Send + Sync {
    /// Rows owned by `owner_id`, newest first.
    async fn list_for_owner(
        &self,
        owner_id: &str,
        credential: &Credential,
    ) -> DbResult<Vec<CatalogEntry>>;

    /// A single row, or `None` when it does not exist or is not visible.
    async fn find(&self, id: &str, credential: &Credential) -> DbResult<Option<CatalogEntry>>;

    /// Insert a row and return it as stored.
    async fn insert(
        &self,
        entry: &NewCatalogEntry,
        credential: &Credential,
    ) -> DbResult<CatalogEntry>;

    /// Write `is_favourite`; `None` when no visible row matched.
    async fn set_favourite(
        &self,
        id: &str,
        is_favourite: bool,
        credential: &Credential,
    ) -> DbResult<Option<CatalogEntry>>;

    /// Up to `limit` rows in store order, for diagnostics.
    async fn sample(&self, limit: usize, credential: &Credential) -> DbResult<Vec<CatalogEntry>>;

    /// Check that the store is reachable
    async fn health_check(&self) -> DbResult<()>;
}

/// Access to `playlists` and `playlist_songs`.
///
/// Writes return the representation the store sends back, which is always an array.
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    async fn list(&self, credential: &Credential) -> DbResult<Vec<Playlist>>;

    async fn create(&self, name: &str, credential: &Credential) -> DbResult<Vec<Playlist>>;

    async fn get_with_songs(
        &self,
        id: &str,
        credential: &Credential,
    ) -> DbResult<Vec<PlaylistWithSongs>>;

    async fn add_song(
        &self,
        playlist_id: &str,
        song_id: &str,
        credential: &Credential,
    ) -> DbResult<Vec<PlaylistSong>>;
}
