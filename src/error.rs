use std::time::Duration;

use reqwest::StatusCode;

/// Errors raised while talking to the backing store or serving its content.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A credential or secret is missing or still set to its placeholder.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream error ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The document exists but does not match the song schema.
    #[error("malformed content in {path}: {reason}")]
    MalformedContent { path: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A background task panicked or was cancelled before producing a result.
    #[error("background task failed: {0}")]
    Task(String),
}

impl Error {
    /// Timeouts, transport faults, rate limits and 5xx responses are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Upstream { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            _ => false,
        }
    }

    pub fn malformed(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedContent {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
