//! Error types for backend clients.

use ingest_core::CollaboratorError;
use thiserror::Error;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<BackendError> for CollaboratorError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Http(e) => CollaboratorError::Http(e.to_string()),
            BackendError::Status { status, body } => CollaboratorError::Status { status, body },
        }
    }
}

/// Turn a non-success response into [`BackendError::Status`].
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}
