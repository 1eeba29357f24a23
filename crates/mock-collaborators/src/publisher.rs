//! Mock realtime publisher.

use std::sync::{Arc, Mutex};

use ingest_core::{async_trait, BroadcastEvent, CollaboratorError, RealtimePublisher};

use crate::lock;

/// A publisher that records every event it is asked to send.
#[derive(Clone, Default)]
pub struct MockPublisher {
    events: Arc<Mutex<Vec<BroadcastEvent>>>,
    fail: bool,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record events but report every publish as failed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<BroadcastEvent> {
        lock(&self.events).clone()
    }

    /// Topics published to, in order.
    pub fn topics(&self) -> Vec<String> {
        lock(&self.events).iter().map(|e| e.topic.clone()).collect()
    }
}

#[async_trait]
impl RealtimePublisher for MockPublisher {
    async fn publish(&self, event: BroadcastEvent) -> Result<(), CollaboratorError> {
        lock(&self.events).push(event);
        if self.fail {
            return Err(CollaboratorError::Unavailable("realtime down".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_even_when_failing() {
        let publisher = MockPublisher::failing();
        let result = publisher
            .publish(BroadcastEvent {
                topic: "t".to_string(),
                event: "e".to_string(),
                payload: serde_json::Value::Null,
            })
            .await;
        assert!(result.is_err());
        assert_eq!(publisher.topics(), vec!["t".to_string()]);
    }
}
