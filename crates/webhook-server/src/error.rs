//! Error types for the webhook endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ingest::IngestError;
use thiserror::Error;

/// Errors that reach the webhook caller.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Body is not JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Ingestion failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::InvalidJson(err) => {
                tracing::warn!("Rejected webhook body: {}", err);
                StatusCode::BAD_REQUEST
            }
            WebhookError::Ingest(err) if err.is_client_error() => {
                tracing::warn!("Rejected webhook delivery: {}", err);
                StatusCode::BAD_REQUEST
            }
            WebhookError::Ingest(err) => {
                tracing::error!("Ingestion failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "ok": false,
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for webhook handlers.
pub type Result<T> = std::result::Result<T, WebhookError>;
