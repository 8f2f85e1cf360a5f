use thiserror::Error;

/// Why a duration could not be determined.
///
/// Never surfaced to clients: a failed probe records the default duration.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("empty file")]
    Empty,

    #[error("unrecognized audio format")]
    Unsupported,

    #[error("corrupt {format} data: {reason}")]
    Corrupt {
        format: &'static str,
        reason: String,
    },

    #[error("ffprobe failed: {0}")]
    Ffprobe(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("probe task failed: {0}")]
    Join(String),
}

impl ProbeError {
    pub(crate) fn corrupt(format: &'static str, reason: impl Into<String>) -> Self {
        ProbeError::Corrupt {
            format,
            reason: reason.into(),
        }
    }
}
