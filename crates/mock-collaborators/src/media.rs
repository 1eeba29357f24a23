//! Mock provider media source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ingest_core::{async_trait, CollaboratorError, MediaLink, MediaLinkRequest, MediaSource};
use tokio::time::sleep;

use crate::lock;

#[derive(Default)]
struct State {
    links: HashMap<String, MediaLink>,
    requests: Vec<MediaLinkRequest>,
    fetched: Vec<String>,
}

/// A media source answering from a fixed table of links.
///
/// Unknown message ids fail like a provider 404. Clones share state.
#[derive(Clone, Default)]
pub struct MockMediaSource {
    state: Arc<Mutex<State>>,
    fail_links: bool,
    fail_fetch: bool,
    delay: Option<Duration>,
    bytes: Vec<u8>,
}

impl MockMediaSource {
    pub fn new() -> Self {
        Self {
            bytes: b"media-bytes".to_vec(),
            ..Default::default()
        }
    }

    /// Register a durable link for a message id.
    pub fn with_link(self, external_id: &str, url: &str, mimetype: &str) -> Self {
        lock(&self.state).links.insert(
            external_id.to_string(),
            MediaLink {
                url: Some(url.to_string()),
                transcoded_url: None,
                mimetype: Some(mimetype.to_string()),
            },
        );
        self
    }

    /// Register a full link response for a message id.
    pub fn with_media_link(self, external_id: &str, link: MediaLink) -> Self {
        lock(&self.state).links.insert(external_id.to_string(), link);
        self
    }

    /// Make every link request fail.
    pub fn failing_links(mut self) -> Self {
        self.fail_links = true;
        self
    }

    /// Make every byte download fail.
    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Delay every call, for timeout tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Link requests received so far.
    pub fn requests(&self) -> Vec<MediaLinkRequest> {
        lock(&self.state).requests.clone()
    }

    /// URLs downloaded so far.
    pub fn fetched(&self) -> Vec<String> {
        lock(&self.state).fetched.clone()
    }
}

#[async_trait]
impl MediaSource for MockMediaSource {
    async fn durable_link(&self, request: MediaLinkRequest) -> Result<MediaLink, CollaboratorError> {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        let mut state = lock(&self.state);
        state.requests.push(request.clone());

        if self.fail_links {
            return Err(CollaboratorError::Status {
                status: 500,
                body: "mock failure".to_string(),
            });
        }

        state
            .links
            .get(&request.external_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::Status {
                status: 404,
                body: format!("no media for {}", request.external_id),
            })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CollaboratorError> {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        lock(&self.state).fetched.push(url.to_string());

        if self.fail_fetch {
            return Err(CollaboratorError::Http("connection reset".to_string()));
        }
        Ok(self.bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str) -> MediaLinkRequest {
        MediaLinkRequest {
            token: "tok".to_string(),
            external_id: id.to_string(),
            transcode_audio: false,
        }
    }

    #[tokio::test]
    async fn test_known_and_unknown_links() {
        let source = MockMediaSource::new().with_link("A", "https://cdn.test/a.png", "image/png");

        let link = source.durable_link(request("A")).await.unwrap();
        assert_eq!(link.mimetype.as_deref(), Some("image/png"));

        let err = source.durable_link(request("B")).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Status { status: 404, .. }));
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_fetch() {
        let source = MockMediaSource::new().failing_fetch();
        assert!(source.fetch("https://cdn.test/a.png").await.is_err());
        assert_eq!(source.fetched(), vec!["https://cdn.test/a.png".to_string()]);
    }
}
