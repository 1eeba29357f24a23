//! Inbound webhook endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::error::Result;
use crate::state::AppState;

/// Receive one webhook delivery.
///
/// Every handled case, skips included, answers 200. Side effects keep running
/// after the response is sent.
pub async fn receive(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let payload: Value = serde_json::from_slice(&body)?;
    let ingested = state.pipeline.ingest(payload).await?;
    Ok(Json(ingested.outcome.to_json()))
}

/// Bare `OPTIONS` probe. CORS headers come from the router's layer.
pub async fn preflight() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
