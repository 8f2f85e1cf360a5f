//! Playlist routes.
//!
//! These routes take no caller token; they run with the service credential.

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use cloudbeat_core::{AppError, Credential, Playlist, PlaylistSong, PlaylistWithSongs};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddSongRequest {
    /// Accepted as a JSON string or number.
    #[serde(default)]
    pub song_id: Option<Value>,
}

impl AddSongRequest {
    fn song_id(&self) -> Option<String> {
        match self.song_id.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[tracing::instrument(skip(state), fields(operation = "list_playlists"))]
pub async fn list_playlists(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Playlist>>, HttpAppError> {
    let playlists = state.catalog.playlists.list(&Credential::Service).await?;
    Ok(Json(playlists))
}

#[tracing::instrument(skip(state, request), fields(operation = "create_playlist"))]
pub async fn create_playlist(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreatePlaylistRequest>,
) -> Result<Json<Vec<Playlist>>, HttpAppError> {
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Name is required".to_string()))?;

    let created = state
        .catalog
        .playlists
        .create(name, &Credential::Service)
        .await?;
    Ok(Json(created))
}

#[tracing::instrument(skip(state), fields(operation = "get_playlist"))]
pub async fn get_playlist(
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
) -> Result<Json<Vec<PlaylistWithSongs>>, HttpAppError> {
    let rows = state
        .catalog
        .playlists
        .get_with_songs(&playlist_id, &Credential::Service)
        .await?;
    Ok(Json(rows))
}

#[tracing::instrument(skip(state, request), fields(operation = "add_playlist_song"))]
pub async fn add_song(
    State(state): State<Arc<AppState>>,
    Path(playlist_id): Path<String>,
    ValidatedJson(request): ValidatedJson<AddSongRequest>,
) -> Result<Json<Vec<PlaylistSong>>, HttpAppError> {
    let song_id = request
        .song_id()
        .ok_or_else(|| AppError::InvalidInput("song_id is required".to_string()))?;

    let rows = state
        .catalog
        .playlists
        .add_song(&playlist_id, &song_id, &Credential::Service)
        .await?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn song_id(body: Value) -> Option<String> {
        serde_json::from_value::<AddSongRequest>(body).unwrap().song_id()
    }

    #[test]
    fn test_song_id_accepts_string_or_number() {
        assert_eq!(song_id(json!({"song_id": "42"})), Some("42".to_string()));
        assert_eq!(song_id(json!({"song_id": 42})), Some("42".to_string()));
    }

    #[test]
    fn test_song_id_missing_or_blank() {
        assert_eq!(song_id(json!({})), None);
        assert_eq!(song_id(json!({"song_id": ""})), None);
        assert_eq!(song_id(json!({"song_id": null})), None);
        assert_eq!(song_id(json!({"song_id": false})), None);
    }
}
