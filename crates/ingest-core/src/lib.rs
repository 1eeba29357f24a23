//! Core traits and types shared by the ingestion pipeline and its collaborators.
//!
//! The pipeline talks to four external systems, each behind a trait so that
//! production HTTP clients and in-memory test doubles are interchangeable:
//!
//! - [`MediaSource`] - the WhatsApp provider (durable media links, downloads)
//! - [`ObjectStore`] - owned object storage for rehosted media
//! - [`RealtimePublisher`] - realtime broadcast to subscriber topics
//! - [`Transcriber`] - asynchronous audio transcription
//!
//! # Example
//!
//! ```rust
//! use ingest_core::{async_trait, CollaboratorError, Transcriber, TranscriptionRequest};
//!
//! struct NoopTranscriber;
//!
//! #[async_trait]
//! impl Transcriber for NoopTranscriber {
//!     async fn request(&self, _request: TranscriptionRequest) -> Result<(), CollaboratorError> {
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "noop"
//!     }
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::CollaboratorError;
pub use traits::{MediaSource, ObjectStore, RealtimePublisher, Transcriber};
pub use types::{BroadcastEvent, MediaLink, MediaLinkRequest, StoredObject, TranscriptionRequest};

// Re-export async_trait for implementors
pub use async_trait::async_trait;
