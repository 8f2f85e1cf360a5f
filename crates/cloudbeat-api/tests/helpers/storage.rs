use async_trait::async_trait;
use cloudbeat_core::{CatalogEntry, Credential, NewCatalogEntry, StorageBackend};
use cloudbeat_db::{DbError, DbResult, InMemorySongRepository, SongRepository};
use cloudbeat_storage::{
    BlobStore, BucketStatus, SignedUrlResponse, StorageError, StorageResult, UploadReader,
};
use std::sync::Mutex;
use std::time::Duration;

/// Blob store with scripted outcomes.
pub struct StubBlobStore {
    pub fail_uploads: bool,
    pub sign_response: SignedUrlResponse,
    pub uploaded: Mutex<Vec<String>>,
}

impl StubBlobStore {
    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            sign_response: SignedUrlResponse::Url("https://cdn.test/unused".to_string()),
            uploaded: Mutex::new(Vec::new()),
        }
    }

    pub fn signing(response: SignedUrlResponse) -> Self {
        Self {
            fail_uploads: false,
            sign_response: response,
            uploaded: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BlobStore for StubBlobStore {
    async fn upload(
        &self,
        storage_key: &str,
        _reader: UploadReader,
        _content_length: Option<u64>,
        _content_type: &str,
        _credential: &Credential,
    ) -> StorageResult<()> {
        if self.fail_uploads {
            return Err(StorageError::UploadFailed("bucket unavailable".to_string()));
        }
        self.uploaded.lock().unwrap().push(storage_key.to_string());
        Ok(())
    }

    async fn create_signed_url(
        &self,
        _storage_key: &str,
        _expires_in: Duration,
        _credential: &Credential,
    ) -> StorageResult<SignedUrlResponse> {
        Ok(self.sign_response.clone())
    }

    async fn ensure_bucket(&self, _public: bool) -> StorageResult<BucketStatus> {
        Ok(BucketStatus::Updated)
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Song repository whose inserts are refused; every other call hits `inner`.
#[derive(Clone, Default)]
pub struct RejectingSongRepository {
    pub inner: InMemorySongRepository,
}

#[async_trait]
impl SongRepository for RejectingSongRepository {
    async fn list_for_owner(
        &self,
        owner_id: &str,
        credential: &Credential,
    ) -> DbResult<Vec<CatalogEntry>> {
        self.inner.list_for_owner(owner_id, credential).await
    }

    async fn find(&self, id: &str, credential: &Credential) -> DbResult<Option<CatalogEntry>> {
        self.inner.find(id, credential).await
    }

    async fn insert(
        &self,
        _entry: &NewCatalogEntry,
        _credential: &Credential,
    ) -> DbResult<CatalogEntry> {
        Err(DbError::Upstream {
            status: 503,
            message: "catalog unavailable".to_string(),
        })
    }

    async fn set_favourite(
        &self,
        id: &str,
        is_favourite: bool,
        credential: &Credential,
    ) -> DbResult<Option<CatalogEntry>> {
        self.inner.set_favourite(id, is_favourite, credential).await
    }

    async fn sample(&self, limit: usize, credential: &Credential) -> DbResult<Vec<CatalogEntry>> {
        self.inner.sample(limit, credential).await
    }

    async fn health_check(&self) -> DbResult<()> {
        self.inner.health_check().await
    }
}
