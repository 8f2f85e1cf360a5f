//! `/files/{*key}`: the target of the local backend's signed URLs.
//! The HMAC token in the query is the only credential.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use cloudbeat_core::AppError;
use cloudbeat_storage::content_type_for;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SignedFileQuery {
    #[serde(default)]
    pub token: String,
}

#[tracing::instrument(skip(state, query), fields(operation = "serve_signed_blob"))]
pub async fn get_public_file(
    State(state): State<Arc<AppState>>,
    Path(storage_key): Path<String>,
    Query(query): Query<SignedFileQuery>,
) -> Result<Response, HttpAppError> {
    let local = state
        .storage
        .local
        .as_ref()
        .ok_or_else(|| AppError::NotFound("File serving is not enabled".to_string()))?;

    let token = query.token.trim();
    if token.is_empty() {
        return Err(HttpAppError::from(AppError::InvalidInput(
            "Missing token parameter".to_string(),
        )));
    }

    let (stream, size) = local.open_signed(&storage_key, token).await?;
    tracing::debug!(storage_key = %storage_key, size_bytes = size, "Serving signed blob");

    let body = Body::from_stream(stream.map(|chunk| chunk.map_err(std::io::Error::other)));
    let headers = [
        (header::CONTENT_TYPE, content_type_for(&storage_key).to_string()),
        (header::CONTENT_LENGTH, size.to_string()),
        (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
    ];

    Ok((headers, body).into_response())
}
