//! WhatsApp provider client library.
//!
//! This crate talks to the provider's HTTP API on behalf of a tenant
//! instance. It supports:
//!
//! - Exchanging a message id for a durable media download link
//! - Requesting MP3 transcoding for audio messages
//! - Downloading media bytes
//!
//! # Example
//!
//! ```no_run
//! use provider_client::{ProviderClient, ProviderConfig};
//!
//! # async fn example() -> Result<(), provider_client::ProviderError> {
//! let client = ProviderClient::new(ProviderConfig::new("https://provider.example.com"))?;
//!
//! let link = client.download_link("instance-token", "3EB0C767D26A", false).await?;
//! println!("durable link: {:?}", link.file_url);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::ProviderClient;
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use types::{DownloadRequest, DownloadResponse};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
