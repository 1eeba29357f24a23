//! Error types for provider-client.

use ingest_core::CollaboratorError;
use thiserror::Error;

/// Errors that can occur when calling the provider API.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider returned a non-success status.
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Missing instance token.
    #[error("missing instance token")]
    MissingToken,
}

impl From<ProviderError> for CollaboratorError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Http(e) => CollaboratorError::Http(e.to_string()),
            ProviderError::Json(e) => CollaboratorError::Decode(e.to_string()),
            ProviderError::Status { status, body } => CollaboratorError::Status { status, body },
            ProviderError::MissingToken => {
                CollaboratorError::Unavailable("missing instance token".to_string())
            }
        }
    }
}
