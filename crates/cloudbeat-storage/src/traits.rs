//! Blob storage abstraction trait
//!
//! This module defines the BlobStore trait that all storage backends must implement.
//! Every data-plane call carries a [`Credential`] so the backend can enforce the
//! owner-scoped storage policies on the caller's behalf.

use crate::StorageBackend;
use async_trait::async_trait;
use cloudbeat_core::Credential;
use serde_json::Value;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::BackendError(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Reader handed to [`BlobStore::upload`].
pub type UploadReader = Pin<Box<dyn AsyncRead + Send + Sync + Unpin>>;

/// Outcome of [`BlobStore::ensure_bucket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Created,
    Updated,
    /// The bucket already existed with the requested visibility.
    Unchanged,
}

/// Normalized answer of a signed-URL request.
///
/// Storage platforms answer this call in several shapes depending on client and
/// server version; callers only ever deal with these three cases.
#[derive(Debug, Clone, PartialEq)]
pub enum SignedUrlResponse {
    /// An absolute, time-limited URL.
    Url(String),
    /// The platform reported an error in-band.
    Upstream(String),
    /// Anything else. Kept verbatim for logging.
    Malformed(Value),
}

impl SignedUrlResponse {
    /// Classify a raw response body.
    ///
    /// Relative URLs (`/object/sign/...`) are joined to `storage_api_base`
    /// (for Supabase, `{project_url}/storage/v1`).
    pub fn from_value(value: Value, storage_api_base: &str) -> Self {
        let url = match &value {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map
                .get("signedURL")
                .or_else(|| map.get("signedUrl"))
                .and_then(Value::as_str),
            _ => None,
        };

        if let Some(url) = url.filter(|u| !u.is_empty()) {
            return SignedUrlResponse::Url(absolute_url(url, storage_api_base));
        }

        if let Some(err) = value.as_object().and_then(|map| map.get("error")) {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .map(|m| format!("{}: {}", render(err), m))
                .unwrap_or_else(|| render(err));
            return SignedUrlResponse::Upstream(message);
        }

        SignedUrlResponse::Malformed(value)
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn absolute_url(url: &str, base: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    let base = base.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{}{}", base, url)
    } else {
        format!("{}/{}", base, url)
    }
}

/// Blob storage abstraction trait
///
/// All storage backends (Supabase Storage, local filesystem) must implement this
/// trait. Keys are produced by [`crate::keys::allocate_storage_key`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write the reader's content under `storage_key`.
    ///
    /// Keys are never overwritten; an existing key is an upload failure.
    async fn upload(
        &self,
        storage_key: &str,
        reader: UploadReader,
        content_length: Option<u64>,
        content_type: &str,
        credential: &Credential,
    ) -> StorageResult<()>;

    /// Ask for a time-limited read URL.
    ///
    /// Transport failures are errors; anything the backend answered is returned
    /// as a [`SignedUrlResponse`] for the caller to interpret.
    async fn create_signed_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
        credential: &Credential,
    ) -> StorageResult<SignedUrlResponse>;

    /// Create the bucket, or make the existing one match `public`.
    async fn ensure_bucket(&self, public: bool) -> StorageResult<BucketStatus>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://project.supabase.co/storage/v1";

    #[test]
    fn test_bare_string_is_url() {
        let res = SignedUrlResponse::from_value(json!("https://cdn.example/a.mp3?t=1"), BASE);
        assert_eq!(res, SignedUrlResponse::Url("https://cdn.example/a.mp3?t=1".into()));
    }

    #[test]
    fn test_relative_signed_url_is_joined() {
        let res = SignedUrlResponse::from_value(
            json!({"signedURL": "/object/sign/music/u/1_a.mp3?token=abc"}),
            BASE,
        );
        assert_eq!(
            res,
            SignedUrlResponse::Url(
                "https://project.supabase.co/storage/v1/object/sign/music/u/1_a.mp3?token=abc"
                    .into()
            )
        );
    }

    #[test]
    fn test_camel_case_key_accepted() {
        let res = SignedUrlResponse::from_value(
            json!({"signedUrl": "https://x/object/sign/music/k?token=t", "path": "k"}),
            BASE,
        );
        assert!(matches!(res, SignedUrlResponse::Url(u) if u.starts_with("https://x/")));
    }

    #[test]
    fn test_error_object_is_upstream() {
        let res = SignedUrlResponse::from_value(
            json!({"statusCode": "404", "error": "not_found", "message": "Object not found"}),
            BASE,
        );
        assert_eq!(
            res,
            SignedUrlResponse::Upstream("not_found: Object not found".into())
        );
    }

    #[test]
    fn test_unknown_shape_is_malformed() {
        let value = json!({"data": null});
        let res = SignedUrlResponse::from_value(value.clone(), BASE);
        assert_eq!(res, SignedUrlResponse::Malformed(value));

        let res = SignedUrlResponse::from_value(json!(42), BASE);
        assert!(matches!(res, SignedUrlResponse::Malformed(_)));
    }
}
