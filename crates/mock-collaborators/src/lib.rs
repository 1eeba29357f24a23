//! Mock collaborator implementations for ingestion tests.
//!
//! This crate provides recording, in-memory implementations of every
//! `ingest-core` collaborator trait:
//! - `MockMediaSource` - canned durable links and bytes, optional failure/delay
//! - `MockObjectStore` - records uploads and returns deterministic URLs
//! - `MockPublisher` - records broadcast events
//! - `MockTranscriber` - records transcription jobs
//!
//! # Example
//!
//! ```rust
//! use mock_collaborators::{MediaSource, MediaLinkRequest, MockMediaSource};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = MockMediaSource::new().with_link("ABC", "https://cdn.test/abc.jpg", "image/jpeg");
//!
//!     let link = source
//!         .durable_link(MediaLinkRequest {
//!             token: "tok".to_string(),
//!             external_id: "ABC".to_string(),
//!             transcode_audio: false,
//!         })
//!         .await
//!         .unwrap();
//!     assert_eq!(link.url.as_deref(), Some("https://cdn.test/abc.jpg"));
//! }
//! ```

mod media;
mod publisher;
mod store;
mod transcriber;

// Re-export ingest-core types for convenience
pub use ingest_core::{
    async_trait, BroadcastEvent, CollaboratorError, MediaLink, MediaLinkRequest, MediaSource,
    ObjectStore, RealtimePublisher, StoredObject, Transcriber, TranscriptionRequest,
};

pub use media::MockMediaSource;
pub use publisher::MockPublisher;
pub use store::{MockObjectStore, Upload};
pub use transcriber::MockTranscriber;

use std::sync::{Mutex, MutexGuard};

/// Lock a mutex, recovering the data if a panicking test poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
