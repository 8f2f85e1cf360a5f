use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::deserialize_id;
use super::song::CatalogEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Membership row in `playlist_songs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSong {
    #[serde(deserialize_with = "deserialize_id")]
    pub playlist_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub song_id: String,
}

/// A playlist with its member songs resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistWithSongs {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub songs: Vec<CatalogEntry>,
}

/// Wire shape of `select=*,playlist_songs(song:songs(*))`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistEmbedRow {
    #[serde(flatten)]
    pub playlist: Playlist,
    #[serde(default)]
    pub playlist_songs: Vec<PlaylistSongEmbed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistSongEmbed {
    /// Null when the referenced song is not visible to the credential.
    pub song: Option<CatalogEntry>,
}

impl From<PlaylistEmbedRow> for PlaylistWithSongs {
    fn from(row: PlaylistEmbedRow) -> Self {
        PlaylistWithSongs {
            id: row.playlist.id,
            name: row.playlist.name,
            created_at: row.playlist.created_at,
            songs: row.playlist_songs.into_iter().filter_map(|e| e.song).collect(),
        }
    }
}
