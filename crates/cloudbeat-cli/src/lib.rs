//! Operator helpers for the CloudBeat catalog.

use cloudbeat_storage::BucketStatus;
use std::time::Duration;

/// DDL for the favourite flag. The REST interface does not run DDL, so the
/// operator pastes this into the platform's SQL editor.
pub const FAVOURITE_COLUMN_DDL: &str =
    "ALTER TABLE songs ADD COLUMN IF NOT EXISTS is_favourite BOOLEAN DEFAULT FALSE;";

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// HTTP client for talking to the data platform.
pub fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Word printed for the outcome of `create-bucket`.
pub fn bucket_status_label(status: BucketStatus) -> &'static str {
    match status {
        BucketStatus::Created => "Created",
        BucketStatus::Updated => "Updated",
        BucketStatus::Unchanged => "Unchanged",
    }
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
