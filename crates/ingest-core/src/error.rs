//! Error type shared by all collaborator implementations.

use thiserror::Error;

/// Errors returned by an external collaborator call.
///
/// The pipeline treats every collaborator as best-effort, so these errors are
/// logged and swallowed rather than propagated to the webhook caller.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The remote answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The call did not finish within its time bound.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The collaborator refused or is not configured.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(err: serde_json::Error) -> Self {
        CollaboratorError::Decode(err.to_string())
    }
}
