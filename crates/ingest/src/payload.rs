//! Payload unwrapping and classification.
//!
//! Webhook bodies arrive in three transport shapes (array-wrapped,
//! `body`-enveloped, flat) and three semantic shapes (status update, raw
//! agent message, provider event). [`unwrap_payload`] removes the transport
//! wrapping and [`classify`] decides the semantic shape before any message
//! field is read.

use serde_json::{Map, Value};

use crate::extract;

/// Keys carrying the provider's event-type discriminator.
const EVENT_TYPE_KEYS: &[&str] = &["EventType", "eventType", "event_type", "event"];

/// Keys carrying the assistant status-channel value.
const STATUS_KEYS: &[&str] = &["status_ia", "statusIa", "statusIA", "status_IA"];

/// Keys naming the tenant instance.
const INSTANCE_KEYS: &[&str] = &["instanceName", "instance_name", "instance", "instanceId", "instance_id"];

/// Keys carrying the tenant owner address.
const OWNER_KEYS: &[&str] = &["owner", "instanceOwner"];

/// Keys carrying an already-resolved inbox id.
const INBOX_KEYS: &[&str] = &["inbox_id", "inboxId"];

/// Keys identifying the chat.
pub(crate) const CHAT_KEYS: &[&str] = &["chatid", "chatId", "chat_id", "remoteJid"];

/// Keys whose presence means the payload carries message content.
const CONTENT_KEYS: &[&str] = &["text", "caption", "content", "fileURL", "fileUrl"];

/// Discriminator value for message events.
const MESSAGE_EVENT: &str = "messages";

/// A payload with transport wrapping removed.
#[derive(Debug, Clone)]
pub struct Unwrapped {
    /// The effective payload object.
    pub payload: Value,
    /// The original delivery, kept because some encodings carry the status
    /// value only at the outer level.
    pub raw: Value,
}

/// Strip array and `body`/`Body` envelope wrapping.
///
/// Never fails: unexpected shapes yield a payload without the fields
/// downstream stages look for.
pub fn unwrap_payload(raw: Value) -> Unwrapped {
    let outer = match &raw {
        Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    };

    let payload = match extract::object(&outer, &["body", "Body"]) {
        Some(body) if extract::text(body, EVENT_TYPE_KEYS).is_some() => body.clone(),
        _ => outer,
    };

    Unwrapped { payload, raw }
}

/// How the tenant can be identified from a delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityHint {
    /// Instance id or name as sent by the provider.
    pub instance: Option<String>,
    /// Owner address of the instance.
    pub owner: Option<String>,
    /// Inbox already resolved upstream (agent-originated events).
    pub inbox_id: Option<String>,
}

impl IdentityHint {
    fn from_payload(payload: &Value) -> Self {
        let message = extract::object(payload, &["message"]);
        Self {
            instance: extract::text(payload, INSTANCE_KEYS),
            owner: extract::text(payload, OWNER_KEYS)
                .or_else(|| message.and_then(|m| extract::text(m, OWNER_KEYS))),
            inbox_id: extract::text(payload, INBOX_KEYS),
        }
    }
}

/// A status-channel value as received.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSignal {
    /// The raw JSON value.
    pub raw: Value,
}

impl StatusSignal {
    /// Interpret the value as enabled/disabled. `None` when unrecognized.
    pub fn enabled(&self) -> Option<bool> {
        match &self.raw {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "ligada" | "ligado" | "ativa" | "ativada" | "ativo" | "on" | "true" | "enabled"
                | "1" => Some(true),
                "desligada" | "desligado" | "desativada" | "desativado" | "inativa" | "off"
                | "false" | "disabled" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// A message event in the provider's canonical shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderEvent {
    pub identity: IdentityHint,
    /// The `message` object; absent on structurally invalid deliveries.
    pub message: Option<Value>,
    /// The `chat` object, used for contact names.
    pub chat: Option<Value>,
    /// Status-channel value carried alongside the message.
    pub status: Option<StatusSignal>,
}

/// A bare status-channel update, possibly followed by a message.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub signal: StatusSignal,
    pub chat_id: Option<String>,
    pub identity: IdentityHint,
    /// Message content delivered together with the status value.
    pub follow_up: Option<ProviderEvent>,
}

/// The semantic shape of a delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// No discriminator, status field present.
    StatusUpdate(StatusUpdate),
    /// No discriminator, chat or content present; already synthesized.
    RawMessage(ProviderEvent),
    /// Discriminator equal to the message event.
    ProviderEvent(ProviderEvent),
    /// Any other discriminator, or nothing recognizable.
    Ignored { event_type: Option<String> },
}

/// Classify an unwrapped payload.
///
/// Precedence, highest first:
/// 1. no discriminator and a status field: [`Delivery::StatusUpdate`]
/// 2. no discriminator and a chat id or content: [`Delivery::RawMessage`]
/// 3. discriminator `messages`: [`Delivery::ProviderEvent`]
/// 4. anything else: [`Delivery::Ignored`]
///
/// Rule 1 precedes rule 2 so that a status update naming its chat is never
/// taken for a chat message.
pub fn classify(unwrapped: &Unwrapped) -> Delivery {
    let payload = &unwrapped.payload;
    let event_type = extract::text(payload, EVENT_TYPE_KEYS);
    let status = find_status(payload, &unwrapped.raw);

    match (event_type, status) {
        (None, Some(signal)) => Delivery::StatusUpdate(StatusUpdate {
            chat_id: chat_id_of(payload),
            identity: IdentityHint::from_payload(payload),
            follow_up: has_content(payload).then(|| synthesize(payload, Some(signal.clone()))),
            signal,
        }),
        (None, None) if chat_id_of(payload).is_some() || has_content(payload) => {
            Delivery::RawMessage(synthesize(payload, None))
        }
        (None, None) => Delivery::Ignored { event_type: None },
        (Some(event_type), status) if event_type.trim().eq_ignore_ascii_case(MESSAGE_EVENT) => {
            Delivery::ProviderEvent(ProviderEvent {
                identity: IdentityHint::from_payload(payload),
                message: extract::object(payload, &["message"]).cloned(),
                chat: extract::object(payload, &["chat"]).cloned(),
                status,
            })
        }
        (Some(event_type), _) => Delivery::Ignored {
            event_type: Some(event_type),
        },
    }
}

/// Locate the status-channel value in the payload, its message, or the raw
/// outer delivery.
fn find_status(payload: &Value, raw: &Value) -> Option<StatusSignal> {
    let outer = match raw {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    };

    let mut places = vec![payload];
    if let Some(message) = extract::object(payload, &["message"]) {
        places.push(message);
    }
    places.push(outer);
    if let Some(body) = extract::object(outer, &["body", "Body"]) {
        places.push(body);
    }

    places.into_iter().find_map(|place| {
        extract::any(place, STATUS_KEYS).map(|raw| StatusSignal { raw: raw.clone() })
    })
}

fn chat_id_of(payload: &Value) -> Option<String> {
    extract::text(payload, CHAT_KEYS).or_else(|| {
        extract::object(payload, &["message"]).and_then(|m| extract::text(m, CHAT_KEYS))
    })
}

/// Whether the payload, or the message nested in it, carries content.
fn has_content(payload: &Value) -> bool {
    let carries = |place: &Value| {
        CONTENT_KEYS.iter().any(|key| match place.get(*key) {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            _ => false,
        })
    };
    carries(payload) || extract::object(payload, &["message"]).is_some_and(carries)
}

/// Rewrite a flat agent-originated payload into a provider event.
///
/// Agent payloads that carry content but no direction are messages the
/// agent sent, so they default to outgoing.
fn synthesize(payload: &Value, status: Option<StatusSignal>) -> ProviderEvent {
    let mut message: Map<String, Value> = match extract::object(payload, &["message"]) {
        Some(Value::Object(nested)) => nested.clone(),
        _ => payload.as_object().cloned().unwrap_or_default(),
    };

    if extract::flag(&Value::Object(message.clone()), &["fromMe", "from_me"]).is_none() {
        message.insert("fromMe".to_string(), Value::Bool(has_content(payload)));
    }
    if extract::text(&Value::Object(message.clone()), CHAT_KEYS).is_none() {
        if let Some(chat_id) = chat_id_of(payload) {
            message.insert("chatid".to_string(), Value::String(chat_id));
        }
    }

    ProviderEvent {
        identity: IdentityHint::from_payload(payload),
        message: Some(Value::Object(message)),
        chat: extract::object(payload, &["chat"]).cloned(),
        status,
    }
}
