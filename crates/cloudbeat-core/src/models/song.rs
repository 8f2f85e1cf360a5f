use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::ids::deserialize_id;
use crate::constants::{DEFAULT_ALBUM, DEFAULT_ARTIST, DEFAULT_DURATION};

/// A catalog row in the `songs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default = "default_artist", deserialize_with = "artist_or_default")]
    pub artist: String,
    #[serde(default = "default_album", deserialize_with = "album_or_default")]
    pub album: String,
    /// Blob key; the column predates object storage and is still named `drive_id`.
    #[serde(rename = "drive_id", alias = "storage_path")]
    pub storage_key: String,
    #[serde(default = "default_duration", deserialize_with = "duration_or_default")]
    pub duration: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mime_type: String,
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_favourite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for a catalog row. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCatalogEntry {
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde(rename = "drive_id", alias = "storage_path")]
    pub storage_key: String,
    pub duration: String,
    pub mime_type: String,
    pub user_id: String,
    pub is_favourite: bool,
}

impl NewCatalogEntry {
    /// Builds an insert payload, applying catalog defaults to blank fields.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: impl Into<String>,
        storage_key: impl Into<String>,
        original_filename: &str,
        title: Option<&str>,
        artist: Option<&str>,
        album: Option<&str>,
        duration: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        fn present(v: Option<&str>) -> Option<String> {
            v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
        }

        NewCatalogEntry {
            title: present(title).unwrap_or_else(|| original_filename.to_string()),
            artist: present(artist).unwrap_or_else(default_artist),
            album: present(album).unwrap_or_else(default_album),
            storage_key: storage_key.into(),
            duration: duration.into(),
            mime_type: mime_type.into(),
            user_id: user_id.into(),
            is_favourite: false,
        }
    }

    /// Materializes the row as the store would return it.
    pub fn into_entry(self, id: String, created_at: Option<DateTime<Utc>>) -> CatalogEntry {
        CatalogEntry {
            id,
            title: self.title,
            artist: self.artist,
            album: self.album,
            storage_key: self.storage_key,
            duration: self.duration,
            mime_type: self.mime_type,
            user_id: self.user_id,
            is_favourite: self.is_favourite,
            created_at,
        }
    }
}

fn default_artist() -> String {
    DEFAULT_ARTIST.to_string()
}

fn default_album() -> String {
    DEFAULT_ALBUM.to_string()
}

fn default_duration() -> String {
    DEFAULT_DURATION.to_string()
}

// Rows written by older clients carry explicit nulls in optional columns.

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn null_as_false<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(d)?.unwrap_or(false))
}

fn artist_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_artist))
}

fn album_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_album))
}

fn duration_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_duration))
}
