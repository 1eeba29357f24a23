//! The ingestion pipeline.
//!
//! Unwrap, classify, merge status, resolve identity, normalize, deduplicate,
//! resolve media, resolve the thread, persist, and fan out.

use std::sync::Arc;
use std::time::Duration;

use database::Database;
use ingest_core::{MediaSource, ObjectStore, RealtimePublisher, Transcriber};
use serde_json::Value;
use tracing::{info, instrument};

use crate::dedup;
use crate::error::Result;
use crate::fanout::{BackgroundTasks, FanOut, StoredMessage};
use crate::identity::{self, IdentityOutcome, ResolvedIdentity};
use crate::media::MediaResolver;
use crate::normalize::normalize;
use crate::outcome::{Outcome, SkipReason};
use crate::payload::{classify, unwrap_payload, Delivery, ProviderEvent};
use crate::persist::{persist, Persisted};
use crate::resolver::{phone_from_jid, resolve_thread};
use crate::status::{self, StatusMerge};

/// Default bound on each media network step.
pub const DEFAULT_MEDIA_TIMEOUT: Duration = Duration::from_secs(20);

/// Default name of the per-tenant lead list.
pub const DEFAULT_LEAD_LIST: &str = "WhatsApp leads";

/// Outbound collaborators used by the pipeline.
#[derive(Clone)]
pub struct Collaborators {
    pub media_source: Arc<dyn MediaSource>,
    pub object_store: Arc<dyn ObjectStore>,
    pub publisher: Arc<dyn RealtimePublisher>,
    pub transcriber: Arc<dyn Transcriber>,
}

/// Pipeline behavior knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub media_timeout: Duration,
    /// Static topics every stored message is also broadcast to.
    pub extra_topics: Vec<String>,
    pub lead_list_name: String,
    /// Process group chats instead of skipping them.
    pub accept_groups: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            media_timeout: DEFAULT_MEDIA_TIMEOUT,
            extra_topics: Vec::new(),
            lead_list_name: DEFAULT_LEAD_LIST.to_string(),
            accept_groups: false,
        }
    }
}

/// Result of one ingestion: the acknowledged outcome and the side effects
/// still running.
#[derive(Debug)]
pub struct Ingested {
    pub outcome: Outcome,
    pub background: BackgroundTasks,
}

impl Ingested {
    fn done(outcome: Outcome) -> Self {
        Self {
            outcome,
            background: BackgroundTasks::default(),
        }
    }
}

/// Identity and conversation already known when a message is processed.
struct Known {
    identity: ResolvedIdentity,
    conversation_id: Option<String>,
    /// The status merge already wrote the assistant flag.
    status_written: bool,
}

/// Stateless per-delivery ingestion pipeline.
#[derive(Clone)]
pub struct Pipeline {
    db: Database,
    media: MediaResolver,
    fanout: FanOut,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(db: Database, collaborators: Collaborators, config: PipelineConfig) -> Self {
        let media = MediaResolver::new(
            collaborators.media_source,
            collaborators.object_store,
            config.media_timeout,
        );
        let fanout = FanOut::new(
            collaborators.publisher,
            collaborators.transcriber,
            config.extra_topics.clone(),
            config.lead_list_name.clone(),
        );
        Self {
            db,
            media,
            fanout,
            config,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Ingest one webhook delivery.
    ///
    /// Side effects are spawned onto the runtime and returned unjoined.
    pub async fn ingest(&self, raw: Value) -> Result<Ingested> {
        let unwrapped = unwrap_payload(raw);

        let ingested = match classify(&unwrapped) {
            Delivery::Ignored { event_type } => {
                info!(event_type = event_type.as_deref().unwrap_or("none"), "Ignoring non-message event");
                Ingested::done(Outcome::Skipped(SkipReason::NotMessageEvent))
            }
            Delivery::ProviderEvent(event) | Delivery::RawMessage(event) => {
                self.process(event, None).await?
            }
            Delivery::StatusUpdate(update) => {
                let merged = status::merge(&self.db, &update).await?;
                match (merged, update.follow_up) {
                    (
                        StatusMerge::Applied {
                            conversation_id,
                            enabled,
                            ..
                        },
                        None,
                    ) => Ingested::done(Outcome::StatusOnly {
                        conversation_id,
                        enabled,
                    }),
                    (StatusMerge::Unapplied { reason, .. }, None) => {
                        Ingested::done(Outcome::Skipped(reason))
                    }
                    (
                        StatusMerge::Applied {
                            identity,
                            conversation_id,
                            ..
                        },
                        Some(event),
                    ) => {
                        let known = Known {
                            identity,
                            conversation_id: Some(conversation_id),
                            status_written: true,
                        };
                        self.process(event, Some(known)).await?
                    }
                    (
                        StatusMerge::Unapplied {
                            identity: Some(identity),
                            ..
                        },
                        Some(event),
                    ) => {
                        let known = Known {
                            identity,
                            conversation_id: None,
                            status_written: false,
                        };
                        self.process(event, Some(known)).await?
                    }
                    (StatusMerge::Unapplied { identity: None, reason }, Some(_)) => {
                        Ingested::done(Outcome::Skipped(reason))
                    }
                }
            }
        };

        if let Some(reason) = ingested.outcome.reason() {
            info!(reason, "Delivery acknowledged without new message");
        }

        Ok(ingested)
    }

    #[instrument(skip_all, fields(external_id = tracing::field::Empty))]
    async fn process(&self, event: ProviderEvent, known: Option<Known>) -> Result<Ingested> {
        let (identity, known_conversation, status_written) = match known {
            Some(known) => (known.identity, known.conversation_id, known.status_written),
            None => match identity::resolve(&self.db, &event.identity).await? {
                IdentityOutcome::Resolved(identity) => (identity, None, false),
                IdentityOutcome::InstanceNotFound => {
                    info!(instance = ?event.identity.instance, "Instance not found");
                    return Ok(Ingested::done(Outcome::Skipped(SkipReason::InstanceNotFound)));
                }
                IdentityOutcome::NoInbox => {
                    return Ok(Ingested::done(Outcome::Skipped(SkipReason::NoInbox)))
                }
            },
        };

        let mut msg = normalize(&event)?;
        if msg.owner.is_none() {
            msg.owner = identity.owner.clone();
        }
        if let Some(external_id) = &msg.external_id {
            tracing::Span::current().record("external_id", external_id.as_str());
        }

        if msg.is_group && !self.config.accept_groups {
            return Ok(Ingested::done(Outcome::Skipped(SkipReason::Group)));
        }

        // Checked before media so redeliveries never re-upload assets.
        if dedup::is_duplicate(&self.db, &msg).await? {
            return Ok(Ingested::done(Outcome::Skipped(SkipReason::Duplicate)));
        }

        self.media.resolve(&mut msg, &identity.token).await;

        let thread =
            resolve_thread(&self.db, &identity.inbox_id, &msg, known_conversation.as_deref()).await?;
        let status = event.status.as_ref().and_then(|s| s.enabled());
        let pending_status = status.filter(|_| !status_written);

        let stored = match persist(&self.db, &thread, &msg, pending_status).await? {
            Persisted::Inserted(stored) => stored,
            Persisted::Duplicate => {
                return Ok(Ingested::done(Outcome::Skipped(SkipReason::DuplicateIndex)))
            }
            Persisted::NoInsert => return Ok(Ingested::done(Outcome::Skipped(SkipReason::NoInsert))),
        };

        info!(
            conversation_id = %stored.conversation_id,
            message_id = %stored.id,
            direction = %stored.direction,
            media_type = %stored.media_type,
            "Message stored"
        );

        let outcome = Outcome::Stored {
            conversation_id: stored.conversation_id.clone(),
            message_id: stored.id.clone(),
        };
        let background = self.fanout.dispatch(
            &self.db,
            StoredMessage {
                message: stored,
                inbox_id: identity.inbox_id,
                instance_id: identity.instance_id,
                phone: thread.contact.phone.clone().or_else(|| phone_from_jid(&msg.chat_id)),
                contact_name: thread.contact.name.clone().or(msg.sender_name),
                status,
            },
        );

        Ok(Ingested { outcome, background })
    }
}
