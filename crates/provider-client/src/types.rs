//! Request and response types for the provider media API.

use serde::{Deserialize, Serialize};

/// Body of a media download request.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadRequest {
    /// Provider message id.
    pub id: String,
    /// Ask for a link instead of inline base64.
    pub return_link: bool,
    /// Ask the provider to transcode audio to MP3.
    pub generate_mp3: bool,
}

impl DownloadRequest {
    /// Build a link-returning request for a message id.
    pub fn link(id: impl Into<String>, generate_mp3: bool) -> Self {
        Self {
            id: id.into(),
            return_link: true,
            generate_mp3,
        }
    }
}

/// Response of a media download request.
///
/// Field names vary between provider versions, so each field accepts the
/// known aliases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadResponse {
    /// Durable link to the original asset.
    #[serde(default, alias = "fileUrl", alias = "fileURL", alias = "url")]
    pub file_url: Option<String>,

    /// Durable link to the MP3 rendition.
    #[serde(default, alias = "mp3Url", alias = "mp3URL", alias = "mp3Link")]
    pub mp3_url: Option<String>,

    /// Reported MIME type.
    #[serde(default, alias = "mimeType", alias = "mimetype")]
    pub mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_response_aliases() {
        let resp: DownloadResponse = serde_json::from_str(
            r#"{"fileURL":"https://cdn/x.ogg","mp3URL":"https://cdn/x.mp3","mimetype":"audio/ogg"}"#,
        )
        .unwrap();
        assert_eq!(resp.file_url.as_deref(), Some("https://cdn/x.ogg"));
        assert_eq!(resp.mp3_url.as_deref(), Some("https://cdn/x.mp3"));
        assert_eq!(resp.mime_type.as_deref(), Some("audio/ogg"));
    }

    #[test]
    fn test_download_request_serialization() {
        let json = serde_json::to_value(DownloadRequest::link("ABC", true)).unwrap();
        assert_eq!(json["id"], "ABC");
        assert_eq!(json["return_link"], true);
        assert_eq!(json["generate_mp3"], true);
    }
}
