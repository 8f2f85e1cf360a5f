use crate::traits::{
    BlobStore, BucketStatus, SignedUrlResponse, StorageError, StorageResult, UploadReader,
};
use crate::StorageBackend;
use async_trait::async_trait;
use cloudbeat_core::Credential;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

/// Supabase Storage API backend.
///
/// Data-plane calls (`upload`, `create_signed_url`) are sent with the caller's
/// bearer token so the bucket policies are evaluated for that user. Bucket
/// management and health checks use the project API key.
#[derive(Clone)]
pub struct SupabaseBlobStore {
    http: Client,
    storage_api: String,
    api_key: String,
    bucket: String,
}

impl SupabaseBlobStore {
    pub fn new(http: Client, project_url: &str, api_key: String, bucket: String) -> Self {
        Self {
            http,
            storage_api: format!("{}/storage/v1", project_url.trim_end_matches('/')),
            api_key,
            bucket,
        }
    }

    fn encoded_key(storage_key: &str) -> String {
        storage_key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn with_auth(&self, request: RequestBuilder, credential: &Credential) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(credential.bearer(&self.api_key))
    }

    async fn failure_text(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("status {}: {}", status, body)
    }
}

#[async_trait]
impl BlobStore for SupabaseBlobStore {
    async fn upload(
        &self,
        storage_key: &str,
        reader: UploadReader,
        content_length: Option<u64>,
        content_type: &str,
        credential: &Credential,
    ) -> StorageResult<()> {
        let url = format!(
            "{}/object/{}/{}",
            self.storage_api,
            self.bucket,
            Self::encoded_key(storage_key)
        );
        let start = Instant::now();

        let body = reqwest::Body::wrap_stream(tokio_util::io::ReaderStream::new(reader));
        let mut request = self
            .with_auth(self.http.post(&url), credential)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(body);
        if let Some(len) = content_length {
            request = request.header(reqwest::header::CONTENT_LENGTH, len);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = Self::failure_text(response).await;
            tracing::warn!(
                key = %storage_key,
                status = %status,
                "Supabase storage upload rejected"
            );
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    StorageError::PermissionDenied(text)
                }
                _ => StorageError::UploadFailed(text),
            });
        }

        tracing::info!(
            key = %storage_key,
            bucket = %self.bucket,
            size_bytes = content_length,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Supabase storage upload successful"
        );

        Ok(())
    }

    async fn create_signed_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
        credential: &Credential,
    ) -> StorageResult<SignedUrlResponse> {
        let url = format!(
            "{}/object/sign/{}/{}",
            self.storage_api,
            self.bucket,
            Self::encoded_key(storage_key)
        );
        let start = Instant::now();

        let response = self
            .with_auth(self.http.post(&url), credential)
            .json(&json!({ "expiresIn": expires_in.as_secs() }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(
            key = %storage_key,
            status = %status,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Supabase storage sign request completed"
        );

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(SignedUrlResponse::from_value(value, &self.storage_api)),
            Err(_) if status.is_success() => Ok(SignedUrlResponse::Malformed(Value::String(text))),
            Err(_) => Ok(SignedUrlResponse::Upstream(format!("status {}: {}", status, text))),
        }
    }

    async fn ensure_bucket(&self, public: bool) -> StorageResult<BucketStatus> {
        let bucket_url = format!("{}/bucket/{}", self.storage_api, self.bucket);
        let existing = self
            .with_auth(self.http.get(&bucket_url), &Credential::Service)
            .send()
            .await?;

        if existing.status().is_success() {
            let current_public = existing
                .json::<Value>()
                .await
                .ok()
                .and_then(|bucket| bucket.get("public").and_then(Value::as_bool));
            if current_public == Some(public) {
                tracing::debug!(bucket = %self.bucket, public, "Bucket already configured");
                return Ok(BucketStatus::Unchanged);
            }

            let response = self
                .with_auth(self.http.put(&bucket_url), &Credential::Service)
                .json(&json!({ "id": self.bucket, "name": self.bucket, "public": public }))
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(StorageError::BackendError(Self::failure_text(response).await));
            }
            tracing::info!(bucket = %self.bucket, public, "Bucket updated");
            return Ok(BucketStatus::Updated);
        }

        // The API answers 400 or 404 for a missing bucket depending on version.
        if !matches!(
            existing.status(),
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST
        ) {
            return Err(StorageError::BackendError(Self::failure_text(existing).await));
        }

        let response = self
            .with_auth(
                self.http.post(format!("{}/bucket", self.storage_api)),
                &Credential::Service,
            )
            .json(&json!({ "id": self.bucket, "name": self.bucket, "public": public }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StorageError::BackendError(Self::failure_text(response).await));
        }

        tracing::info!(bucket = %self.bucket, public, "Bucket created");
        Ok(BucketStatus::Created)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let response = self
            .with_auth(
                self.http
                    .get(format!("{}/bucket/{}", self.storage_api, self.bucket)),
                &Credential::Service,
            )
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(StorageError::BackendError(Self::failure_text(response).await))
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Supabase
    }
}
