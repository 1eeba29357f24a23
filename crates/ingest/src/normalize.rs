//! Canonical message extraction.
//!
//! Every field is produced by an ordered list of extractors where the first
//! non-empty value wins. Wrongly-typed fields count as absent.

use chrono::{DateTime, TimeZone, Utc};
use database::{Direction, MediaType};
use serde_json::{json, Value};

use crate::error::{IngestError, Result};
use crate::extract;
use crate::payload::{ProviderEvent, CHAT_KEYS};

const MESSAGE_ID_KEYS: &[&str] = &["messageid", "messageId", "message_id", "id"];
const MEDIA_TYPE_KEYS: &[&str] = &["mediaType", "media_type", "messageType", "type"];
const FILE_URL_KEYS: &[&str] = &["fileURL", "fileUrl", "file_url"];
const CONTENT_URL_KEYS: &[&str] = &["URL", "url"];
const MIMETYPE_KEYS: &[&str] = &["mimetype", "mimeType", "mime_type"];
const FILE_NAME_KEYS: &[&str] = &["fileName", "filename", "file_name"];
const SENDER_NAME_KEYS: &[&str] = &["senderName", "pushName"];
const CHAT_NAME_KEYS: &[&str] = &["name", "wa_name", "wa_contactName"];
const TIMESTAMP_KEYS: &[&str] = &["messageTimestamp", "timestamp"];

/// Timestamps above this are milliseconds (year 2001 in ms, year 33658 in s).
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// A message in canonical form, ready for media resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMessage {
    pub chat_id: String,
    pub direction: Direction,
    /// Provider id with any colon-delimited prefix removed.
    pub external_id: Option<String>,
    /// Provider id as received.
    pub raw_external_id: Option<String>,
    pub media_type: MediaType,
    pub content: Option<String>,
    /// Provider link, durable URL, or a contact-card JSON blob.
    pub media_url: Option<String>,
    pub mimetype: Option<String>,
    pub file_name: Option<String>,
    /// Best display name for the remote party.
    pub sender_name: Option<String>,
    /// Owner address of the receiving instance, used for legacy ids.
    pub owner: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub is_group: bool,
}

impl NormalizedMessage {
    /// Historical encodings of the external id.
    ///
    /// The `<owner>:<id>` form comes first whenever the owner is known; a raw
    /// id that already carried a different prefix follows it.
    pub fn legacy_external_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        if let (Some(owner), Some(id)) = (self.owner.as_deref(), self.external_id.as_deref()) {
            ids.push(format!("{}:{}", owner, id));
        }
        if let Some(raw) = self.raw_external_id.as_deref() {
            if raw.contains(':') && !ids.iter().any(|id| id == raw) {
                ids.push(raw.to_string());
            }
        }
        ids
    }
}

/// Map an arbitrary provider type string onto a canonical media type.
///
/// Case-insensitive substring match; empty or unrecognized strings are text.
pub fn map_media_type(provider_type: &str) -> MediaType {
    let lowered = provider_type.to_lowercase();
    let has = |needle: &str| lowered.contains(needle);

    if has("image") {
        MediaType::Image
    } else if has("video") {
        MediaType::Video
    } else if has("audio") || has("ptt") {
        MediaType::Audio
    } else if has("document") || has("pdf") {
        MediaType::Document
    } else if has("sticker") {
        MediaType::Sticker
    } else if has("contact") || has("vcard") {
        MediaType::Contact
    } else {
        MediaType::Text
    }
}

/// Extract the canonical message from a provider event.
pub fn normalize(event: &ProviderEvent) -> Result<NormalizedMessage> {
    let message = event
        .message
        .as_ref()
        .filter(|m| m.is_object())
        .ok_or(IngestError::MissingMessage("message"))?;
    let chat = event.chat.as_ref().unwrap_or(&Value::Null);
    let content_obj = extract::object(message, &["content"]);

    let chat_id = extract::text(message, CHAT_KEYS)
        .or_else(|| extract::text(chat, &["wa_chatid", "chatid"]))
        .ok_or(IngestError::MissingMessage("chat id"))?;

    let direction = Direction::from_me(extract::flag(message, &["fromMe", "from_me"]).unwrap_or(false));

    let raw_external_id = extract::text(message, MESSAGE_ID_KEYS);
    let external_id = raw_external_id.as_deref().and_then(strip_prefix);

    let vcard = vcard_of(message, content_obj);
    let media_type = match vcard {
        Some(_) => MediaType::Contact,
        None => map_media_type(&extract::text(message, MEDIA_TYPE_KEYS).unwrap_or_default()),
    };

    let file_name = extract::first_present([
        extract::text(message, FILE_NAME_KEYS),
        content_obj.and_then(|c| extract::text(c, FILE_NAME_KEYS)),
    ]);

    let mut content = extract::first_present([
        extract::text(message, &["text"]),
        extract::text(message, &["caption"]),
        extract::text(message, &["content"]),
        content_obj.and_then(|c| extract::text(c, &["text"])),
        content_obj.and_then(|c| extract::text(c, &["caption"])),
    ]);

    let media_url = match &vcard {
        Some(card) => {
            if content.is_none() {
                content = card.display_name.clone();
            }
            Some(card.to_json())
        }
        None => extract::first_present([
            extract::text(message, FILE_URL_KEYS),
            content_obj.and_then(|c| extract::text(c, CONTENT_URL_KEYS)),
        ]),
    };

    if media_type == MediaType::Document && content.is_none() {
        content = file_name.clone();
    }

    let mimetype = extract::first_present([
        extract::text(message, MIMETYPE_KEYS),
        content_obj.and_then(|c| extract::text(c, MIMETYPE_KEYS)),
    ]);

    // On outgoing messages the sender is the instance itself.
    let sender_name = match direction {
        Direction::Incoming => extract::first_present([
            extract::text(message, SENDER_NAME_KEYS),
            extract::text(chat, CHAT_NAME_KEYS),
        ]),
        Direction::Outgoing => extract::text(chat, CHAT_NAME_KEYS),
    };

    let is_group = chat_id.ends_with("@g.us")
        || extract::flag(message, &["isGroup", "is_group"]).unwrap_or(false)
        || extract::flag(chat, &["wa_isGroup", "isGroup"]).unwrap_or(false);

    Ok(NormalizedMessage {
        chat_id,
        direction,
        external_id,
        raw_external_id,
        media_type,
        content,
        media_url,
        mimetype,
        file_name,
        sender_name,
        owner: event.identity.owner.clone(),
        timestamp: timestamp_of(message),
        is_group,
    })
}

/// Keep only the segment after the last colon.
fn strip_prefix(raw: &str) -> Option<String> {
    raw.rsplit(':')
        .next()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn timestamp_of(message: &Value) -> DateTime<Utc> {
    extract::integer(message, TIMESTAMP_KEYS)
        .filter(|ts| *ts > 0)
        .and_then(|ts| {
            if ts >= MILLIS_THRESHOLD {
                Utc.timestamp_millis_opt(ts).single()
            } else {
                Utc.timestamp_opt(ts, 0).single()
            }
        })
        .unwrap_or_else(Utc::now)
}

struct ContactCard {
    display_name: Option<String>,
    vcard: String,
}

impl ContactCard {
    fn to_json(&self) -> String {
        json!({
            "displayName": self.display_name,
            "vcard": self.vcard,
        })
        .to_string()
    }
}

fn vcard_of(message: &Value, content: Option<&Value>) -> Option<ContactCard> {
    let vcard = extract::first_present([
        content.and_then(|c| extract::text(c, &["vcard", "vCard"])),
        extract::text(message, &["vcard", "vCard"]),
    ])?;
    let display_name = extract::first_present([
        content.and_then(|c| extract::text(c, &["displayName", "display_name"])),
        extract::text(message, &["displayName"]),
    ]);
    Some(ContactCard { display_name, vcard })
}
