//! Media resolution and rehosting.
//!
//! Every step here is best-effort: a failed or slow collaborator leaves the
//! message with whatever reference it already had.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use database::MediaType;
use ingest_core::{CollaboratorError, MediaLinkRequest, MediaSource, ObjectStore};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, warn};

use crate::normalize::NormalizedMessage;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Known MIME types and their file extensions.
const EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("video/mp4", "mp4"),
    ("video/3gpp", "3gp"),
    ("video/quicktime", "mov"),
    ("audio/ogg", "ogg"),
    ("audio/mpeg", "mp3"),
    ("audio/mp3", "mp3"),
    ("audio/mp4", "m4a"),
    ("audio/aac", "aac"),
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    ("application/vnd.ms-excel", "xls"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    ("application/vnd.ms-powerpoint", "ppt"),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "pptx",
    ),
    ("application/zip", "zip"),
    ("text/plain", "txt"),
    ("text/csv", "csv"),
];

/// File extension for a MIME type, ignoring parameters such as codecs.
pub fn extension_for(mimetype: Option<&str>) -> &'static str {
    let Some(essence) = mimetype.and_then(|m| m.split(';').next()).map(str::trim) else {
        return "bin";
    };
    let essence = essence.to_ascii_lowercase();

    if let Some((_, ext)) = EXTENSIONS.iter().find(|(mime, _)| *mime == essence) {
        return ext;
    }

    match essence.split('/').nth(1) {
        Some("webm") => "webm",
        Some("x-matroska") => "mkv",
        _ => "bin",
    }
}

/// Exchanges provider media ids for durable links and rehosts assets.
#[derive(Clone)]
pub struct MediaResolver {
    source: Arc<dyn MediaSource>,
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl MediaResolver {
    pub fn new(source: Arc<dyn MediaSource>, store: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self {
            source,
            store,
            timeout,
        }
    }

    /// Resolve the media reference of `message` in place.
    ///
    /// Text and contact messages are untouched, as are messages without an
    /// external id or without a tenant token.
    pub async fn resolve(&self, message: &mut NormalizedMessage, token: &str) {
        if !message.media_type.has_binary_asset() {
            return;
        }
        let Some(external_id) = message.external_id.clone() else {
            debug!("Media message without external id, keeping provider reference");
            return;
        };
        if token.is_empty() {
            debug!(external_id = %external_id, "No tenant token, skipping media resolution");
            return;
        }

        let is_audio = message.media_type == MediaType::Audio;
        let request = MediaLinkRequest {
            token: token.to_string(),
            external_id: external_id.clone(),
            transcode_audio: is_audio,
        };

        match self.bounded(self.source.durable_link(request)).await {
            Ok(link) => {
                if let Some(url) = link.preferred_url() {
                    message.media_url = Some(url.to_string());
                }
                if is_audio && link.transcoded_url.is_some() {
                    message.mimetype = Some("audio/mpeg".to_string());
                } else if let Some(mimetype) = link.mimetype {
                    message.mimetype = Some(mimetype);
                }
            }
            Err(e) => warn!(external_id = %external_id, error = %e, "Durable media link lookup failed"),
        }

        if message.media_type == MediaType::Document && message.file_name.is_none() {
            let name = format!("Document.{}", extension_for(message.mimetype.as_deref()));
            if message.content.is_none() {
                message.content = Some(name.clone());
            }
            message.file_name = Some(name);
        }

        if is_audio {
            return;
        }

        let Some(url) = message.media_url.clone() else {
            return;
        };
        match self.rehost(message, &url).await {
            Ok(public_url) => message.media_url = Some(public_url),
            Err(e) => warn!(external_id = %external_id, error = %e, "Media rehost failed, keeping provider link"),
        }
    }

    async fn rehost(&self, message: &NormalizedMessage, url: &str) -> Result<String, CollaboratorError> {
        let bytes = self.bounded(self.source.fetch(url)).await?;
        let content_type = message.mimetype.as_deref().unwrap_or(FALLBACK_CONTENT_TYPE);
        let path = storage_path(message.media_type, message.mimetype.as_deref());
        let stored = self
            .bounded(self.store.upload(&path, bytes, content_type))
            .await?;
        debug!(path = %stored.path, "Media rehosted");
        Ok(stored.public_url)
    }

    async fn bounded<T, F>(&self, step: F) -> Result<T, CollaboratorError>
    where
        F: Future<Output = Result<T, CollaboratorError>>,
    {
        tokio::time::timeout(self.timeout, step)
            .await
            .map_err(|_| CollaboratorError::Timeout(self.timeout))?
    }
}

/// Collision-resistant object path: `<type>/<millis>-<random>.<ext>`.
fn storage_path(media_type: MediaType, mimetype: Option<&str>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    format!(
        "{}/{}-{}.{}",
        media_type,
        Utc::now().timestamp_millis(),
        suffix,
        extension_for(mimetype)
    )
}
