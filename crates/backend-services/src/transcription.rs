//! Transcription function trigger.

use reqwest::Client;
use tracing::debug;

use ingest_core::{async_trait, CollaboratorError, Transcriber, TranscriptionRequest};

use crate::config::BackendConfig;
use crate::error::{check_status, BackendError};

/// Default name of the transcription function.
pub const DEFAULT_FUNCTION: &str = "transcribe-audio";

/// Calls the backend function that transcribes audio messages.
///
/// The function writes its result back onto the message row itself; this
/// client only enqueues the job.
#[derive(Clone)]
pub struct TranscriptionClient {
    http: Client,
    config: BackendConfig,
    function: String,
}

impl TranscriptionClient {
    pub fn new(config: BackendConfig, function: impl Into<String>) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            function: function.into(),
        })
    }

    /// Invoke the function with a job description.
    pub async fn invoke(&self, request: &TranscriptionRequest) -> Result<(), BackendError> {
        debug!(message_id = %request.message_id, function = %self.function, "Requesting transcription");

        let response = self
            .http
            .post(self.config.function_url(&self.function))
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
            .json(request)
            .send()
            .await?;
        check_status(response).await?;

        Ok(())
    }
}

#[async_trait]
impl Transcriber for TranscriptionClient {
    async fn request(&self, request: TranscriptionRequest) -> Result<(), CollaboratorError> {
        Ok(self.invoke(&request).await?)
    }

    fn name(&self) -> &str {
        &self.function
    }
}
