//! Shared key generation for storage backends.
//!
//! Key format: `{owner_id}/{timestamp}_{sanitized_filename}`.

/// Current Unix time in seconds, as used in storage keys.
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Generate the storage key for a new upload.
///
/// The first path segment is always `owner_id`. No collision detection is done:
/// two uploads of the same name by the same owner within one second map to the
/// same key and the second write fails at the backend.
pub fn allocate_storage_key(owner_id: &str, original_filename: &str, timestamp: i64) -> String {
    format!(
        "{}/{}_{}",
        owner_id,
        timestamp,
        sanitize_filename(original_filename)
    )
}

/// Reduce a client-supplied filename to a single safe path segment.
pub fn sanitize_filename(original: &str) -> String {
    let base = original
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .replace("..", "");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Owner segment of a storage key, if the key has one.
pub fn key_owner(storage_key: &str) -> Option<&str> {
    storage_key
        .split_once('/')
        .map(|(owner, _)| owner)
        .filter(|owner| !owner.is_empty())
}
