use thiserror::Error;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum DbError {
    /// The platform refused the credential or a row-level policy rejected the write.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The platform answered with a non-success status.
    #[error("Database returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Database request failed: {0}")]
    Request(String),

    #[error("Failed to decode database response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for DbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DbError::Decode(err.to_string())
        } else {
            DbError::Request(err.to_string())
        }
    }
}

/// Result type for repository operations
pub type DbResult<T> = Result<T, DbError>;
