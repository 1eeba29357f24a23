//! Application state shared across handlers.

use ingest::Pipeline;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Ingestion pipeline.
    pub pipeline: Pipeline,
}

impl AppState {
    /// Create new application state.
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}
