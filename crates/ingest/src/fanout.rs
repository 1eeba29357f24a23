//! Post-persistence side effects.
//!
//! Broadcasts, transcription jobs, and lead-list upserts run as detached
//! tasks. Their failures are logged and never reach the webhook response.

use std::sync::Arc;

use database::{lead_list, Database, Direction, MediaType, Message};
use ingest_core::{BroadcastEvent, RealtimePublisher, Transcriber, TranscriptionRequest};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Broadcast event name for newly stored messages.
pub const NEW_MESSAGE_EVENT: &str = "new_message";

/// Handles of the side effects spawned for one delivery.
#[derive(Debug, Default)]
pub struct BackgroundTasks(Vec<JoinHandle<()>>);

impl BackgroundTasks {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wait for every task. Only tests and graceful shutdown need this.
    pub async fn join(self) {
        for handle in self.0 {
            if let Err(e) = handle.await {
                warn!(error = %e, "Background task panicked");
            }
        }
    }
}

/// What the side effects need to know about a stored message.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub message: Message,
    pub inbox_id: String,
    pub instance_id: Option<String>,
    pub phone: Option<String>,
    pub contact_name: Option<String>,
    pub status: Option<bool>,
}

/// Dispatcher for post-persistence side effects.
#[derive(Clone)]
pub struct FanOut {
    publisher: Arc<dyn RealtimePublisher>,
    transcriber: Arc<dyn Transcriber>,
    extra_topics: Vec<String>,
    lead_list_name: String,
}

impl FanOut {
    pub fn new(
        publisher: Arc<dyn RealtimePublisher>,
        transcriber: Arc<dyn Transcriber>,
        extra_topics: Vec<String>,
        lead_list_name: String,
    ) -> Self {
        Self {
            publisher,
            transcriber,
            extra_topics,
            lead_list_name,
        }
    }

    /// Topics a stored message is broadcast to.
    pub fn topics(&self, inbox_id: &str, conversation_id: &str) -> Vec<String> {
        let mut topics = vec![
            format!("inbox:{}", inbox_id),
            format!("conversation:{}", conversation_id),
        ];
        topics.extend(self.extra_topics.iter().cloned());
        topics
    }

    /// Spawn every side effect for a stored message.
    pub fn dispatch(&self, db: &Database, stored: StoredMessage) -> BackgroundTasks {
        let mut tasks = Vec::new();
        let message = &stored.message;

        let mut payload = json!({
            "conversation_id": message.conversation_id,
            "message_id": message.id,
            "direction": message.direction,
            "media_type": message.media_type,
            "media_url": message.media_url,
            "content": message.content,
            "created_at": message.created_at,
        });
        if let Some(enabled) = stored.status {
            payload["status_ia"] = json!(enabled);
        }

        for topic in self.topics(&stored.inbox_id, &message.conversation_id) {
            let publisher = Arc::clone(&self.publisher);
            let event = BroadcastEvent {
                topic,
                event: NEW_MESSAGE_EVENT.to_string(),
                payload: payload.clone(),
            };
            tasks.push(tokio::spawn(async move {
                let topic = event.topic.clone();
                if let Err(e) = publisher.publish(event).await {
                    warn!(topic = %topic, error = %e, "Broadcast failed");
                }
            }));
        }

        if let Some(request) = transcription_request(message) {
            let transcriber = Arc::clone(&self.transcriber);
            tasks.push(tokio::spawn(async move {
                let message_id = request.message_id.clone();
                match transcriber.request(request).await {
                    Ok(()) => debug!(message_id = %message_id, service = transcriber.name(), "Transcription requested"),
                    Err(e) => warn!(message_id = %message_id, error = %e, "Transcription request failed"),
                }
            }));
        }

        if message.direction == Direction::Incoming {
            if let (Some(instance_id), Some(phone)) = (stored.instance_id.clone(), stored.phone.clone()) {
                let db = db.clone();
                let list_name = self.lead_list_name.clone();
                let name = stored.contact_name.clone();
                tasks.push(tokio::spawn(async move {
                    if let Err(e) = upsert_lead(&db, &instance_id, &list_name, &phone, name.as_deref()).await {
                        warn!(instance_id = %instance_id, error = %e, "Lead list upsert failed");
                    }
                }));
            }
        }

        BackgroundTasks(tasks)
    }
}

/// Incoming audio with a resolved link gets transcribed.
fn transcription_request(message: &Message) -> Option<TranscriptionRequest> {
    if message.direction != Direction::Incoming || message.media_type != MediaType::Audio {
        return None;
    }
    let audio_url = message.media_url.clone().filter(|u| !u.is_empty())?;
    Some(TranscriptionRequest {
        message_id: message.id.clone(),
        audio_url,
        conversation_id: message.conversation_id.clone(),
    })
}

async fn upsert_lead(
    db: &Database,
    instance_id: &str,
    list_name: &str,
    phone: &str,
    name: Option<&str>,
) -> database::Result<()> {
    let list = lead_list::ensure_list(db.pool(), instance_id, list_name).await?;
    let outcome = lead_list::add_lead(db.pool(), &list.id, phone, name).await?;
    debug!(instance_id, phone, ?outcome, "Lead list updated");
    Ok(())
}
