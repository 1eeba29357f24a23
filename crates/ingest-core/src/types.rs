//! Value types passed across collaborator boundaries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request for a durable download link of a provider-hosted media asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLinkRequest {
    /// Tenant auth token used against the provider API.
    pub token: String,
    /// Provider message id (prefix already stripped).
    pub external_id: String,
    /// Ask the provider to transcode audio to MP3.
    pub transcode_audio: bool,
}

/// Durable link returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaLink {
    /// Link to the original asset.
    pub url: Option<String>,
    /// Link to the transcoded asset, when transcoding was requested.
    pub transcoded_url: Option<String>,
    /// Reported MIME type.
    pub mimetype: Option<String>,
}

impl MediaLink {
    /// The link to adopt: the transcoded one when present, else the original.
    pub fn preferred_url(&self) -> Option<&str> {
        self.transcoded_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.url.as_deref().filter(|u| !u.is_empty()))
    }
}

/// Result of uploading an object to owned storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Path inside the bucket.
    pub path: String,
    /// Publicly reachable URL.
    pub public_url: String,
}

/// One realtime broadcast message for a single topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub topic: String,
    pub event: String,
    pub payload: Value,
}

/// Fire-and-forget transcription job for an ingested audio message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionRequest {
    pub message_id: String,
    pub audio_url: String,
    pub conversation_id: String,
}
