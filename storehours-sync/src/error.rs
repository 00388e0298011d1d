//! Error types for storehours-sync.

use thiserror::Error;

use storehours_core::{ConfigError, CoreError};

/// All errors that can arise while talking to Origin or ITSM.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Credential unwrapping failed.
    #[error("credential error: {0}")]
    Core(#[from] CoreError),

    /// A job setting is missing or malformed.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Connection-level failure (DNS, refused, timeout, broken body).
    #[error("transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a status the caller does not accept.
    #[error("{method} {url} returned HTTP {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// Origin did not hand out a usable access token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Response body was not valid JSON.
    #[error("invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Response was JSON but not the expected shape.
    #[error("unexpected payload from {url}: {message}")]
    Shape { url: String, message: String },
}

impl SyncError {
    /// HTTP status carried by a [`SyncError::Status`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience constructor for [`SyncError::Transport`].
pub(crate) fn transport_err(url: impl Into<String>, message: impl ToString) -> SyncError {
    SyncError::Transport {
        url: url.into(),
        message: message.to_string(),
    }
}
