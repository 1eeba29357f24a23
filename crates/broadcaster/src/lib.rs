//! Realtime broadcast utilities for the WhatsApp inbox.
//!
//! This crate publishes events to the backend's realtime broadcast endpoint
//! so that connected agent UIs learn about new messages without polling.
//!
//! # Example
//!
//! ```no_run
//! use broadcaster::{Broadcaster, RealtimeConfig};
//!
//! # async fn example() -> Result<(), broadcaster::Error> {
//! let config = RealtimeConfig::new("https://backend.example.com", "service-key");
//! let broadcaster = Broadcaster::new(config)?;
//!
//! broadcaster
//!     .send("inbox:42", "new_message", serde_json::json!({"message_id": "m1"}))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use ingest_core::{async_trait, BroadcastEvent, CollaboratorError, RealtimePublisher};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during broadcast operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the broadcast.
    #[error("broadcast rejected with {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<Error> for CollaboratorError {
    fn from(err: Error) -> Self {
        match err {
            Error::Http(e) => CollaboratorError::Http(e.to_string()),
            Error::Rejected { status, body } => CollaboratorError::Status { status, body },
        }
    }
}

/// Connection settings for the realtime endpoint.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Backend base URL.
    pub base_url: String,
    /// Service key sent as `apikey` and bearer token.
    pub service_key: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl RealtimeConfig {
    /// Create a configuration with a 10 second timeout.
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Get the broadcast endpoint URL.
    pub fn broadcast_url(&self) -> String {
        format!("{}/realtime/v1/api/broadcast", self.base_url)
    }
}

#[derive(Serialize)]
struct BroadcastBody<'a> {
    messages: [&'a BroadcastEvent; 1],
}

/// A publisher for realtime broadcast events.
#[derive(Clone)]
pub struct Broadcaster {
    http: Client,
    config: RealtimeConfig,
}

impl Broadcaster {
    /// Create a broadcaster for the given backend.
    pub fn new(config: RealtimeConfig) -> Result<Self, Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        info!(url = %config.broadcast_url(), "Broadcaster configured");
        Ok(Self { http, config })
    }

    /// Publish a payload to a topic.
    pub async fn send(&self, topic: &str, event: &str, payload: Value) -> Result<(), Error> {
        self.publish_event(&BroadcastEvent {
            topic: topic.to_string(),
            event: event.to_string(),
            payload,
        })
        .await
    }

    /// Publish a prepared event.
    pub async fn publish_event(&self, event: &BroadcastEvent) -> Result<(), Error> {
        debug!(topic = %event.topic, event = %event.event, "Publishing broadcast");

        let response = self
            .http
            .post(self.config.broadcast_url())
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
            .json(&BroadcastBody { messages: [event] })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// Get the configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }
}

#[async_trait]
impl RealtimePublisher for Broadcaster {
    async fn publish(&self, event: BroadcastEvent) -> Result<(), CollaboratorError> {
        Ok(self.publish_event(&event).await?)
    }
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_publish_wraps_event_in_messages() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/realtime/v1/api/broadcast"))
            .and(header("apikey", "key"))
            .and(header("authorization", "Bearer key"))
            .and(body_json(serde_json::json!({
                "messages": [{
                    "topic": "conversation:c1",
                    "event": "new_message",
                    "payload": {"message_id": "m1"}
                }]
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let broadcaster = Broadcaster::new(RealtimeConfig::new(server.uri(), "key")).unwrap();
        broadcaster
            .publish(BroadcastEvent {
                topic: "conversation:c1".to_string(),
                event: "new_message".to_string(),
                payload: serde_json::json!({"message_id": "m1"}),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_publish_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let broadcaster = Broadcaster::new(RealtimeConfig::new(server.uri(), "wrong")).unwrap();
        let err = broadcaster
            .send("inbox:1", "new_message", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Rejected { status: 401, .. }));
    }
}
