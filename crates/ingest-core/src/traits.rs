//! Collaborator trait definitions.

use async_trait::async_trait;

use crate::error::CollaboratorError;
use crate::types::{BroadcastEvent, MediaLink, MediaLinkRequest, StoredObject, TranscriptionRequest};

/// The WhatsApp provider's media API.
///
/// This trait is object-safe and can be used with `Arc<dyn MediaSource>`.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Exchange a provider message id for a durable download link.
    async fn durable_link(&self, request: MediaLinkRequest) -> Result<MediaLink, CollaboratorError>;

    /// Download the bytes behind a link.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CollaboratorError>;
}

/// Owned object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes under `path` and return the object's public URL.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, CollaboratorError>;
}

/// Realtime broadcast channel towards connected agent UIs.
#[async_trait]
pub trait RealtimePublisher: Send + Sync {
    /// Publish a single event to its topic.
    async fn publish(&self, event: BroadcastEvent) -> Result<(), CollaboratorError>;
}

/// Asynchronous transcription service.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Enqueue a transcription job. Completion is reported out of band.
    async fn request(&self, request: TranscriptionRequest) -> Result<(), CollaboratorError>;

    /// Get a human-readable name for this implementation.
    fn name(&self) -> &str;
}
