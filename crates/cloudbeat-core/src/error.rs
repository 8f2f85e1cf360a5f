//! Gateway error type.
//!
//! All request-level failures of the gateway are unified under [`AppError`].
//! Collaborator crates (storage, db) keep their own error enums and convert
//! into this one at the service boundary.

/// Level an error is logged at when it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Caller mistakes: bad token, bad form, unknown id.
    Debug,
    Warn,
    /// Collaborator or local failures.
    Error,
}

/// How an error is presented to the client.
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable code such as `UPSTREAM_ERROR`.
    fn error_code(&self) -> &'static str;

    /// True when retrying the same request may succeed.
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message placed in the `error` field of the response body.
    fn client_message(&self) -> String;

    /// Sensitive errors never expose `details`, whatever the environment.
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Storage write failed: {0}")]
    StorageWriteFailed(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

struct VariantMeta {
    status: u16,
    code: &'static str,
    recoverable: bool,
    action: Option<&'static str>,
    sensitive: bool,
    level: LogLevel,
}

const fn caller_fault(status: u16, code: &'static str, action: &'static str) -> VariantMeta {
    VariantMeta {
        status,
        code,
        recoverable: false,
        action: Some(action),
        sensitive: false,
        level: LogLevel::Debug,
    }
}

const fn server_fault(code: &'static str, action: &'static str, sensitive: bool) -> VariantMeta {
    VariantMeta {
        status: 500,
        code,
        recoverable: true,
        action: Some(action),
        sensitive,
        level: LogLevel::Error,
    }
}

impl AppError {
    fn meta(&self) -> VariantMeta {
        match self {
            AppError::Unauthenticated(_) => caller_fault(
                401,
                "UNAUTHENTICATED",
                "Sign in again and retry with a fresh bearer token",
            ),
            AppError::InvalidInput(_) => {
                caller_fault(400, "INVALID_INPUT", "Fix the request and send it again")
            }
            AppError::NotFound(_) => caller_fault(
                404,
                "NOT_FOUND",
                "Check that the id exists and belongs to the caller",
            ),
            AppError::PayloadTooLarge(_) => {
                caller_fault(413, "PAYLOAD_TOO_LARGE", "Upload a smaller file")
            }
            AppError::StorageWriteFailed(_) => server_fault(
                "STORAGE_WRITE_FAILED",
                "Retry the upload after a short delay",
                false,
            ),
            AppError::Upstream(_) => {
                server_fault("UPSTREAM_ERROR", "Retry once the platform is reachable", false)
            }
            AppError::Internal(_) | AppError::InternalWithSource { .. } => server_fault(
                "INTERNAL_ERROR",
                "Report the failure if it keeps happening",
                true,
            ),
        }
    }

    /// Variant name shown as `error_type` outside production.
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Unauthenticated(_) => "Unauthenticated",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::StorageWriteFailed(_) => "StorageWriteFailed",
            AppError::Upstream(_) => "Upstream",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// The raw message followed by up to five `Caused by:` lines.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut lines = vec![self.to_string()];
        let mut cause = self.source();
        while let Some(err) = cause {
            if lines.len() > 5 {
                lines.push("  ... (truncated)".to_string());
                break;
            }
            lines.push(format!("  Caused by: {}", err));
            cause = err.source();
        }
        lines.join("\n")
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        self.meta().status
    }

    fn error_code(&self) -> &'static str {
        self.meta().code
    }

    fn is_recoverable(&self) -> bool {
        self.meta().recoverable
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.meta().action
    }

    fn is_sensitive(&self) -> bool {
        self.meta().sensitive
    }

    fn log_level(&self) -> LogLevel {
        self.meta().level
    }

    fn client_message(&self) -> String {
        match self {
            // Collaborator failures carry the collaborator's own text to the client.
            AppError::Unauthenticated(msg)
            | AppError::InvalidInput(msg)
            | AppError::NotFound(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::StorageWriteFailed(msg)
            | AppError::Upstream(msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalWithSource {
            message: "I/O error".to_string(),
            source: err.into(),
        }
    }
}
