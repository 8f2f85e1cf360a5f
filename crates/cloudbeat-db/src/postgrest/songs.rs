use async_trait::async_trait;
use cloudbeat_core::constants::SONGS_TABLE;
use cloudbeat_core::{CatalogEntry, Credential, NewCatalogEntry};
use reqwest::Method;
use serde_json::json;

use super::{eq, PostgrestClient};
use crate::error::{DbError, DbResult};
use crate::traits::SongRepository;

#[derive(Clone)]
pub struct PostgrestSongRepository {
    client: PostgrestClient,
}

impl PostgrestSongRepository {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SongRepository for PostgrestSongRepository {
    #[tracing::instrument(skip(self, credential), fields(db.table = "songs", db.operation = "select"))]
    async fn list_for_owner(
        &self,
        owner_id: &str,
        credential: &Credential,
    ) -> DbResult<Vec<CatalogEntry>> {
        let request = self
            .client
            .request(Method::GET, SONGS_TABLE, credential)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", eq(owner_id)),
                ("order", "created_at.desc".to_string()),
            ]);
        self.client.fetch(request, SONGS_TABLE).await
    }

    #[tracing::instrument(skip(self, credential), fields(db.table = "songs", db.operation = "select", db.record_id = %id))]
    async fn find(&self, id: &str, credential: &Credential) -> DbResult<Option<CatalogEntry>> {
        let request = self
            .client
            .request(Method::GET, SONGS_TABLE, credential)
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        let rows: Vec<CatalogEntry> = self.client.fetch(request, SONGS_TABLE).await?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(skip(self, entry, credential), fields(db.table = "songs", db.operation = "insert"))]
    async fn insert(
        &self,
        entry: &NewCatalogEntry,
        credential: &Credential,
    ) -> DbResult<CatalogEntry> {
        let request = self
            .client
            .request(Method::POST, SONGS_TABLE, credential)
            .header("Prefer", "return=representation")
            .json(entry);
        let rows: Vec<CatalogEntry> = self.client.fetch(request, SONGS_TABLE).await?;
        rows.into_iter().next().ok_or_else(|| DbError::Upstream {
            status: 201,
            message: "insert returned no representation".to_string(),
        })
    }

    #[tracing::instrument(skip(self, credential), fields(db.table = "songs", db.operation = "update", db.record_id = %id))]
    async fn set_favourite(
        &self,
        id: &str,
        is_favourite: bool,
        credential: &Credential,
    ) -> DbResult<Option<CatalogEntry>> {
        let request = self
            .client
            .request(Method::PATCH, SONGS_TABLE, credential)
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(&json!({ "is_favourite": is_favourite }));
        let rows: Vec<CatalogEntry> = self.client.fetch(request, SONGS_TABLE).await?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(skip(self, credential), fields(db.table = "songs", db.operation = "select"))]
    async fn sample(&self, limit: usize, credential: &Credential) -> DbResult<Vec<CatalogEntry>> {
        let request = self
            .client
            .request(Method::GET, SONGS_TABLE, credential)
            .query(&[("select", "*".to_string()), ("limit", limit.to_string())]);
        self.client.fetch(request, SONGS_TABLE).await
    }

    async fn health_check(&self) -> DbResult<()> {
        self.client.ping().await
    }
}
