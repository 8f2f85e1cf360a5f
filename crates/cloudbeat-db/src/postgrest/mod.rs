//! PostgREST-backed repositories.

mod playlists;
mod songs;

pub use playlists::PostgrestPlaylistRepository;
pub use songs::PostgrestSongRepository;

use cloudbeat_core::Credential;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Instant;

use crate::error::{DbError, DbResult};

/// Thin request builder for `{project_url}/rest/v1`.
///
/// Every request carries the project key as `apikey` and the credential's bearer
/// token as `Authorization`, which is what row-level security evaluates.
#[derive(Clone)]
pub struct PostgrestClient {
    http: Client,
    rest_url: String,
    api_key: String,
}

/// Error body PostgREST sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl PostgrestClient {
    pub fn new(http: Client, project_url: &str, api_key: String) -> Self {
        Self {
            http,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key,
        }
    }

    pub(crate) fn request(
        &self,
        method: Method,
        table: &str,
        credential: &Credential,
    ) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(credential.bearer(&self.api_key))
    }

    /// Send and decode a JSON array response.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        table: &str,
    ) -> DbResult<Vec<T>> {
        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();

        tracing::debug!(
            db.table = table,
            status = %status,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "PostgREST request completed"
        );

        if !status.is_success() {
            return Err(Self::error_from(response).await);
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| DbError::Decode(e.to_string()))
    }

    async fn error_from(response: Response) -> DbError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<PostgrestErrorBody>(&text).ok();
        let message = body
            .as_ref()
            .and_then(|b| b.message.clone())
            .unwrap_or(text);
        // 42501 is insufficient_privilege, raised by row-level security on writes.
        let rls_violation = body
            .as_ref()
            .and_then(|b| b.code.as_deref())
            .map_or(false, |code| code == "42501");

        if rls_violation || matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            DbError::PermissionDenied(message)
        } else {
            DbError::Upstream {
                status: status.as_u16(),
                message,
            }
        }
    }

    pub(crate) async fn ping(&self) -> DbResult<()> {
        let response = self
            .http
            .get(format!("{}/", self.rest_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }
}

/// `eq.` filter value for a query parameter.
pub(crate) fn eq(value: &str) -> String {
    format!("eq.{}", value)
}
