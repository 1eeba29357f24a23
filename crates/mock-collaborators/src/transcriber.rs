//! Mock transcription service.

use std::sync::{Arc, Mutex};

use ingest_core::{async_trait, CollaboratorError, Transcriber, TranscriptionRequest};

use crate::lock;

/// A transcriber that records jobs without transcribing anything.
#[derive(Clone, Default)]
pub struct MockTranscriber {
    requests: Arc<Mutex<Vec<TranscriptionRequest>>>,
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<TranscriptionRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn request(&self, request: TranscriptionRequest) -> Result<(), CollaboratorError> {
        lock(&self.requests).push(request);
        Ok(())
    }

    fn name(&self) -> &str {
        "MockTranscriber"
    }
}
