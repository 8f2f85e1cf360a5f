use crate::auth::AuthContext;
use crate::state::AppState;
use cloudbeat_core::{AppError, CatalogEntry};

pub const SONG_NOT_FOUND: &str = "Song not found";

/// Reads and the favourite toggle on the caller's own catalog.
pub struct CatalogService<'a> {
    state: &'a AppState,
}

impl<'a> CatalogService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// The caller's songs, newest first.
    #[tracing::instrument(skip(self, auth), fields(user_id = %auth.user_id, operation = "list_songs"))]
    pub async fn list_songs(&self, auth: &AuthContext) -> Result<Vec<CatalogEntry>, AppError> {
        self.state
            .catalog
            .songs
            .list_for_owner(&auth.user_id, &auth.credential())
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))
    }

    /// Flip `is_favourite` and return the updated row.
    ///
    /// Read then write, both with the caller's credential; concurrent toggles of
    /// the same song are last-writer-wins.
    #[tracing::instrument(skip(self, auth), fields(user_id = %auth.user_id, operation = "toggle_favourite"))]
    pub async fn toggle_favourite(
        &self,
        auth: &AuthContext,
        song_id: &str,
    ) -> Result<CatalogEntry, AppError> {
        let credential = auth.credential();
        let songs = &self.state.catalog.songs;

        let current = songs
            .find(song_id, &credential)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(SONG_NOT_FOUND.to_string()))?;

        songs
            .set_favourite(song_id, !current.is_favourite, &credential)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(SONG_NOT_FOUND.to_string()))
    }
}
