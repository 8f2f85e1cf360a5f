use super::temp_asset::TempAsset;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use cloudbeat_core::constants::DEFAULT_CONTENT_TYPE;
use cloudbeat_core::AppError;
use std::path::Path;

pub const NO_FILE_PART: &str = "No file part in the request";
pub const NO_SELECTED_FILE: &str = "No selected file";

/// An upload form with the file already buffered to disk.
pub struct UploadForm {
    pub asset: TempAsset,
    pub filename: String,
    pub content_type: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
    }
}

fn too_large(max_bytes: usize) -> AppError {
    AppError::PayloadTooLarge(format!(
        "File size exceeds maximum allowed size of {} MB",
        max_bytes / 1024 / 1024
    ))
}

/// Text field value; blank counts as absent.
async fn text_field(field: Field<'_>) -> Result<Option<String>, AppError> {
    let value = field.text().await.map_err(multipart_error)?;
    let trimmed = value.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

async fn buffer_file(
    mut field: Field<'_>,
    temp_dir: Option<&Path>,
    max_bytes: usize,
) -> Result<TempAsset, AppError> {
    let mut asset = TempAsset::create(temp_dir).await?;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if asset.len() + chunk.len() as u64 > max_bytes as u64 {
            asset.close();
            return Err(too_large(max_bytes));
        }
        asset.write(&chunk).await?;
    }
    asset.finish().await?;
    Ok(asset)
}

/// Read the whole form, streaming the `file` part into a [`TempAsset`].
///
/// Exactly one `file` part with a non-empty filename is required. Parts other
/// than `file`, `title`, `artist` and `album` are ignored.
pub async fn read_upload_form(
    mut multipart: Multipart,
    temp_dir: Option<&Path>,
    max_bytes: usize,
) -> Result<UploadForm, AppError> {
    let mut file: Option<(TempAsset, String, String)> = None;
    let mut title = None;
    let mut artist = None;
    let mut album = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                let filename = field.file_name().unwrap_or_default().to_string();
                if filename.is_empty() {
                    return Err(AppError::InvalidInput(NO_SELECTED_FILE.to_string()));
                }
                let content_type = field
                    .content_type()
                    .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_string())
                    .filter(|ct| !ct.is_empty())
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

                let asset = buffer_file(field, temp_dir, max_bytes).await?;
                file = Some((asset, filename, content_type));
            }
            "title" => title = text_field(field).await?,
            "artist" => artist = text_field(field).await?,
            "album" => album = text_field(field).await?,
            other => {
                tracing::debug!(field = %other, "Ignoring unexpected form field");
            }
        }
    }

    let (asset, filename, content_type) =
        file.ok_or_else(|| AppError::InvalidInput(NO_FILE_PART.to_string()))?;

    Ok(UploadForm {
        asset,
        filename,
        content_type,
        title,
        artist,
        album,
    })
}
