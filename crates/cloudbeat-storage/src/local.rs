use crate::keys::key_owner;
use crate::signing;
use crate::traits::{
    BlobStore, BucketStatus, SignedUrlResponse, StorageError, StorageResult, UploadReader,
};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use cloudbeat_core::Credential;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Local filesystem blob store.
///
/// Mirrors the platform's storage policies: a caller may only write or sign keys
/// whose first segment is their own subject. Signed URLs point at the gateway's
/// `/files/{key}?token=` route and carry an HMAC token.
#[derive(Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
    secret: Vec<u8>,
}

impl LocalBlobStore {
    /// Create a new LocalBlobStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory (e.g., "/var/lib/cloudbeat")
    /// * `bucket` - Bucket name, used as a subdirectory of `base_path`
    /// * `base_url` - Public URL of the gateway (e.g., "http://localhost:5000")
    /// * `secret` - HMAC key for signed URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        bucket: &str,
        base_url: String,
        secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let root = base_path.into().join(bucket);

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(LocalBlobStore {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: secret.into(),
        })
    }

    /// Convert storage key to filesystem path, rejecting keys that escape the root
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.starts_with('/')
            || storage_key.contains('\\')
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.root.join(storage_key);
        if path.strip_prefix(&self.root).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    fn authorize(&self, storage_key: &str, credential: &Credential) -> StorageResult<()> {
        match credential {
            Credential::Service => Ok(()),
            Credential::Caller { user_id, .. } => {
                if key_owner(storage_key) == Some(user_id.as_str()) {
                    Ok(())
                } else {
                    Err(StorageError::PermissionDenied(format!(
                        "{} may not access {}",
                        user_id, storage_key
                    )))
                }
            }
        }
    }

    fn file_url(&self, storage_key: &str, token: &str) -> String {
        let encoded: Vec<String> = storage_key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/files/{}?token={}", self.base_url, encoded.join("/"), token)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Open a blob for reading after checking its signed token.
    ///
    /// Returns the byte stream and the blob size.
    pub async fn open_signed(&self, storage_key: &str, token: &str) -> StorageResult<(ByteStream, u64)> {
        signing::verify(token, storage_key, &self.secret)?;
        let path = self.key_to_path(storage_key)?;

        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(storage_key.to_string())
            } else {
                StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
            }
        })?;
        let size = file.metadata().await?.len();

        let stream = tokio_util::io::ReaderStream::new(file).map(|result| {
            result.map_err(|e| StorageError::DownloadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok((Box::pin(stream), size))
    }
}

/// Content type served for a stored key, from its extension.
pub fn content_type_for(storage_key: &str) -> &'static str {
    let ext = storage_key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "webm" => "audio/webm",
        _ => cloudbeat_core::constants::DEFAULT_CONTENT_TYPE,
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(
        &self,
        storage_key: &str,
        mut reader: UploadReader,
        _content_length: Option<u64>,
        _content_type: &str,
        credential: &Credential,
    ) -> StorageResult<()> {
        self.authorize(storage_key, credential)?;
        let path = self.key_to_path(storage_key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
            })?;

        let written = match tokio::io::copy(&mut reader, &mut file).await {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(StorageError::UploadFailed(format!(
                    "Failed to write stream to file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        file.flush().await?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn create_signed_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
        credential: &Credential,
    ) -> StorageResult<SignedUrlResponse> {
        if let Err(e) = self.authorize(storage_key, credential) {
            return Ok(SignedUrlResponse::Upstream(e.to_string()));
        }
        let path = self.key_to_path(storage_key)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(SignedUrlResponse::Upstream(
                "not_found: Object not found".to_string(),
            ));
        }

        let token = signing::create(storage_key, expires_in, &self.secret)?;
        Ok(SignedUrlResponse::Url(self.file_url(storage_key, &token)))
    }

    async fn ensure_bucket(&self, _public: bool) -> StorageResult<BucketStatus> {
        if fs::try_exists(&self.root).await.unwrap_or(false) {
            return Ok(BucketStatus::Unchanged);
        }
        fs::create_dir_all(&self.root).await?;
        Ok(BucketStatus::Created)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.root).await.map_err(|e| {
            StorageError::BackendError(format!("{}: {}", self.root.display(), e))
        })?;
        if meta.is_dir() {
            Ok(())
        } else {
            Err(StorageError::BackendError(format!(
                "{} is not a directory",
                self.root.display()
            )))
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
