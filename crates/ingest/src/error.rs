//! Ingestion error types.
//!
//! Only structural input problems and core persistence failures are errors.
//! Expected no-ops (unknown tenant, duplicates, ignored events) are reported
//! as skipped outcomes instead.

use database::DatabaseError;
use thiserror::Error;

/// Errors that abort an ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The delivery lacks the data needed to build a message.
    #[error("missing message data: {0}")]
    MissingMessage(&'static str),

    /// No instance identifier and no upstream-resolved inbox.
    #[error("missing instance identifier")]
    MissingInstance,

    /// Core persistence failed; the provider should retry.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl IngestError {
    /// Whether the caller sent something unusable (4xx) rather than the
    /// pipeline failing (5xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, IngestError::MissingMessage(_) | IngestError::MissingInstance)
    }
}

/// Result type for ingestion.
pub type Result<T> = std::result::Result<T, IngestError>;
