//! WhatsApp provider HTTP client.

use reqwest::Client;
use tracing::{debug, warn};

use ingest_core::{async_trait, CollaboratorError, MediaLink, MediaLinkRequest, MediaSource};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::types::{DownloadRequest, DownloadResponse};

/// Client for the provider's media endpoints.
#[derive(Clone)]
pub struct ProviderClient {
    http: Client,
    config: ProviderConfig,
}

impl ProviderClient {
    /// Build a client. No request is made until the first call.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Http)?;

        Ok(Self { http, config })
    }

    /// Ask the provider for a durable link to a message's media.
    ///
    /// # Arguments
    /// * `token` - Instance auth token
    /// * `message_id` - Provider message id
    /// * `generate_mp3` - Request an MP3 rendition (audio only)
    pub async fn download_link(
        &self,
        token: &str,
        message_id: &str,
        generate_mp3: bool,
    ) -> Result<DownloadResponse, ProviderError> {
        if token.is_empty() {
            return Err(ProviderError::MissingToken);
        }

        let url = self.config.download_url();
        debug!(message_id, generate_mp3, "Requesting durable media link");

        let response = self
            .http
            .post(&url)
            .header("token", token)
            .json(&DownloadRequest::link(message_id, generate_mp3))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(message_id, status = status.as_u16(), "Media link request failed");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Download the bytes behind a media link.
    pub async fn download_bytes(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Get the configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl MediaSource for ProviderClient {
    async fn durable_link(&self, request: MediaLinkRequest) -> Result<MediaLink, CollaboratorError> {
        let resp = self
            .download_link(&request.token, &request.external_id, request.transcode_audio)
            .await?;

        Ok(MediaLink {
            url: resp.file_url,
            transcoded_url: resp.mp3_url,
            mimetype: resp.mime_type,
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CollaboratorError> {
        Ok(self.download_bytes(url).await?)
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("config", &self.config)
            .finish()
    }
}
