//! In-process repositories.
//!
//! They apply the same owner policy the hosted catalog enforces with row-level
//! security: a caller credential sees and writes only rows whose `user_id` is the
//! caller, the service credential sees everything.

use async_trait::async_trait;
use chrono::Utc;
use cloudbeat_core::{
    CatalogEntry, Credential, NewCatalogEntry, Playlist, PlaylistSong, PlaylistWithSongs,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{DbError, DbResult};
use crate::traits::{PlaylistRepository, SongRepository};

fn visible(row: &CatalogEntry, credential: &Credential) -> bool {
    match credential.user_id() {
        None => true,
        Some(user_id) => row.user_id == user_id,
    }
}

#[derive(Clone, Default)]
pub struct InMemorySongRepository {
    rows: Arc<RwLock<Vec<(u64, CatalogEntry)>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemorySongRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows regardless of owner.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl SongRepository for InMemorySongRepository {
    async fn list_for_owner(
        &self,
        owner_id: &str,
        credential: &Credential,
    ) -> DbResult<Vec<CatalogEntry>> {
        let rows = self.rows.read().await;
        let mut matching: Vec<&(u64, CatalogEntry)> = rows
            .iter()
            .filter(|(_, row)| row.user_id == owner_id && visible(row, credential))
            .collect();
        // created_at desc; insertion sequence breaks ties
        matching.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });
        Ok(matching.into_iter().map(|(_, row)| row.clone()).collect())
    }

    async fn find(&self, id: &str, credential: &Credential) -> DbResult<Option<CatalogEntry>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .map(|(_, row)| row)
            .find(|row| row.id == id && visible(row, credential))
            .cloned())
    }

    async fn insert(
        &self,
        entry: &NewCatalogEntry,
        credential: &Credential,
    ) -> DbResult<CatalogEntry> {
        if let Some(user_id) = credential.user_id() {
            if entry.user_id != user_id {
                return Err(DbError::PermissionDenied(
                    "new row violates row-level security policy for table \"songs\"".to_string(),
                ));
            }
        }

        let mut rows = self.rows.write().await;
        if rows
            .iter()
            .any(|(_, row)| row.storage_key == entry.storage_key)
        {
            return Err(DbError::Upstream {
                status: 409,
                message: "duplicate key value violates unique constraint \"songs_drive_id_key\""
                    .to_string(),
            });
        }

        let seq = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = entry.clone().into_entry(seq.to_string(), Some(Utc::now()));
        rows.push((seq, row.clone()));
        Ok(row)
    }

    async fn set_favourite(
        &self,
        id: &str,
        is_favourite: bool,
        credential: &Credential,
    ) -> DbResult<Option<CatalogEntry>> {
        let mut rows = self.rows.write().await;
        Ok(rows
            .iter_mut()
            .map(|(_, row)| row)
            .find(|row| row.id == id && visible(row, credential))
            .map(|row| {
                row.is_favourite = is_favourite;
                row.clone()
            }))
    }

    async fn sample(&self, limit: usize, credential: &Credential) -> DbResult<Vec<CatalogEntry>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .map(|(_, row)| row)
            .filter(|row| visible(row, credential))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> DbResult<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct InMemoryPlaylistRepository {
    songs: InMemorySongRepository,
    playlists: Arc<RwLock<Vec<Playlist>>>,
    members: Arc<RwLock<Vec<PlaylistSong>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryPlaylistRepository {
    /// Playlists resolve member songs through `songs`.
    pub fn new(songs: InMemorySongRepository) -> Self {
        Self {
            songs,
            playlists: Arc::new(RwLock::new(Vec::new())),
            members: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[async_trait]
impl PlaylistRepository for InMemoryPlaylistRepository {
    async fn list(&self, _credential: &Credential) -> DbResult<Vec<Playlist>> {
        Ok(self.playlists.read().await.clone())
    }

    async fn create(&self, name: &str, _credential: &Credential) -> DbResult<Vec<Playlist>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let playlist = Playlist {
            id: id.to_string(),
            name: name.to_string(),
            created_at: Some(Utc::now()),
        };
        self.playlists.write().await.push(playlist.clone());
        Ok(vec![playlist])
    }

    async fn get_with_songs(
        &self,
        id: &str,
        credential: &Credential,
    ) -> DbResult<Vec<PlaylistWithSongs>> {
        let playlist = match self
            .playlists
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
        {
            Some(p) => p,
            None => return Ok(Vec::new()),
        };

        let song_ids: Vec<String> = self
            .members
            .read()
            .await
            .iter()
            .filter(|m| m.playlist_id == id)
            .map(|m| m.song_id.clone())
            .collect();

        let mut songs = Vec::with_capacity(song_ids.len());
        for song_id in &song_ids {
            if let Some(song) = self.songs.find(song_id, credential).await? {
                songs.push(song);
            }
        }

        Ok(vec![PlaylistWithSongs {
            id: playlist.id,
            name: playlist.name,
            created_at: playlist.created_at,
            songs,
        }])
    }

    async fn add_song(
        &self,
        playlist_id: &str,
        song_id: &str,
        _credential: &Credential,
    ) -> DbResult<Vec<PlaylistSong>> {
        let playlist_exists = self
            .playlists
            .read()
            .await
            .iter()
            .any(|p| p.id == playlist_id);
        let song_exists = self
            .songs
            .find(song_id, &Credential::Service)
            .await?
            .is_some();
        if !playlist_exists || !song_exists {
            return Err(DbError::Upstream {
                status: 409,
                message: "insert or update on table \"playlist_songs\" violates foreign key constraint"
                    .to_string(),
            });
        }

        let member = PlaylistSong {
            playlist_id: playlist_id.to_string(),
            song_id: song_id.to_string(),
        };
        self.members.write().await.push(member.clone());
        Ok(vec![member])
    }
}
