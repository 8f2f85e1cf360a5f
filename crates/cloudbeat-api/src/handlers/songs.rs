use crate::auth::AuthContext;
use crate::error::HttpAppError;
use crate::services::{CatalogService, DeliveryService, IngestService};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use cloudbeat_core::CatalogEntry;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct SongUrlResponse {
    pub url: String,
}

pub async fn list_songs(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<Json<Vec<CatalogEntry>>, HttpAppError> {
    let songs = CatalogService::new(&state).list_songs(&auth).await?;
    Ok(Json(songs))
}

pub async fn upload_song(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    multipart: Multipart,
) -> Result<Json<CatalogEntry>, HttpAppError> {
    let song = IngestService::new(&state).ingest(&auth, multipart).await?;
    Ok(Json(song))
}

pub async fn toggle_favourite(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(song_id): Path<String>,
) -> Result<Json<CatalogEntry>, HttpAppError> {
    let song = CatalogService::new(&state)
        .toggle_favourite(&auth, &song_id)
        .await?;
    Ok(Json(song))
}

pub async fn get_song_url(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(song_id): Path<String>,
) -> Result<Json<SongUrlResponse>, HttpAppError> {
    let url = DeliveryService::new(&state).signed_url(&auth, &song_id).await?;
    Ok(Json(SongUrlResponse { url }))
}
