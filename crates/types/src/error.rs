//! Unified error type for the hlbridge workspace.

use thiserror::Error;

/// Enumerates all error kinds that can occur across hlbridge crates.
#[derive(Debug, Error)]
pub enum HlError {
    /// The authorization-code exchange was rejected or returned no token.
    ///
    /// `body` is the raw provider response, kept for diagnostics.
    #[error("authorization failed: status={status}, body={body}")]
    Authorization { status: u16, body: String },

    /// No stored token exists for the given location.
    #[error("no token stored for location: {0}")]
    NotFound(String),

    /// The refresh-token grant failed; the stored token must not be reused.
    #[error("token refresh failed for location {location_id}: status={status}, body={body}")]
    Refresh {
        location_id: String,
        status: u16,
        body: String,
    },

    /// A downstream CRM API call returned a non-success status.
    #[error("upstream error: status={status}, body={body}")]
    Upstream { status: u16, body: String },

    /// HTTP transport error (connect failure, timeout, ...).
    #[error("http error: {0}")]
    Http(String),

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persistent storage (`SQLite`) error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A precondition of the update-contact workflow was not met.
    #[error("{0}")]
    Workflow(String),
}

// ── Feature-gated From impls ──────────────────────────────────────────────────

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for HlError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for HlError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl HlError {
    /// Raw provider response body attached to the error, if any.
    #[must_use]
    pub fn provider_body(&self) -> Option<&str> {
        match self {
            Self::Authorization { body, .. }
            | Self::Refresh { body, .. }
            | Self::Upstream { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, HlError>;
