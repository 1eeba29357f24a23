//! Clients for the managed backend's storage and function endpoints.
//!
//! - [`StorageClient`] uploads rehosted media into a public bucket.
//! - [`TranscriptionClient`] triggers the audio transcription function.

pub mod config;
pub mod error;
pub mod storage;
pub mod transcription;

pub use config::BackendConfig;
pub use error::BackendError;
pub use storage::StorageClient;
pub use transcription::TranscriptionClient;
