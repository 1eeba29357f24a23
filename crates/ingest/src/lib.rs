//! Inbound WhatsApp event ingestion.
//!
//! Turns provider webhooks and agent-originated events into persisted
//! messages on the right contact and conversation, exactly once per
//! provider message id, then fans the result out to realtime subscribers,
//! the transcription service, and per-tenant lead lists.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use database::Database;
//! use ingest::{Collaborators, Pipeline, PipelineConfig};
//! use mock_collaborators::{MockMediaSource, MockObjectStore, MockPublisher, MockTranscriber};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::in_memory().await?;
//!     let pipeline = Pipeline::new(
//!         db,
//!         Collaborators {
//!             media_source: Arc::new(MockMediaSource::new()),
//!             object_store: Arc::new(MockObjectStore::new()),
//!             publisher: Arc::new(MockPublisher::new()),
//!             transcriber: Arc::new(MockTranscriber::new()),
//!         },
//!         PipelineConfig::default(),
//!     );
//!
//!     let ingested = pipeline
//!         .ingest(serde_json::json!({"EventType": "presence"}))
//!         .await?;
//!     println!("{}", ingested.outcome.to_json());
//!     Ok(())
//! }
//! ```

pub mod dedup;
pub mod error;
pub mod extract;
pub mod fanout;
pub mod identity;
pub mod media;
pub mod normalize;
pub mod outcome;
pub mod payload;
pub mod persist;
pub mod pipeline;
pub mod resolver;
pub mod status;

pub use error::{IngestError, Result};
pub use fanout::BackgroundTasks;
pub use normalize::{map_media_type, NormalizedMessage};
pub use outcome::{Outcome, SkipReason};
pub use payload::{classify, unwrap_payload, Delivery};
pub use pipeline::{Collaborators, Ingested, Pipeline, PipelineConfig};
