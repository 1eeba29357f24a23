//! Database models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A provider-connected messaging account (tenant). Provisioned externally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Instance {
    /// Internal id.
    pub id: String,
    /// Display name, also used by the provider as the instance name.
    pub name: String,
    /// Owner address (e.g., "5511988887777" or "5511988887777@s.whatsapp.net").
    pub owner: Option<String>,
    /// Provider auth token.
    pub token: Option<String>,
}

/// The single messaging queue bound to an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Inbox {
    pub id: String,
    pub instance_id: String,
}

/// A remote party keyed by its provider address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: String,
    /// Provider address (e.g., "5511999998888@s.whatsapp.net").
    pub jid: String,
    /// Digits-only phone derived from the address.
    pub phone: Option<String>,
    /// Display name. Only ever back-filled, never overwritten.
    pub name: Option<String>,
    pub created_at: String,
}

/// Lifecycle status of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum ConversationStatus {
    Open,
    Pending,
    Resolved,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Open => "open",
            ConversationStatus::Pending => "pending",
            ConversationStatus::Resolved => "resolved",
        }
    }

    /// Open and pending conversations both accept new traffic.
    pub fn is_current(&self) -> bool {
        matches!(self, ConversationStatus::Open | ConversationStatus::Pending)
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A threaded exchange between an inbox and a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub id: String,
    pub inbox_id: String,
    pub contact_id: String,
    pub status: ConversationStatus,
    pub priority: String,
    pub unread: bool,
    /// Side-band automated assistant flag. `None` until first set.
    pub assistant_enabled: Option<bool>,
    pub last_message_at: String,
    pub last_message_preview: Option<String>,
    pub created_at: String,
}

/// Direction of a message relative to the inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }

    /// Direction from the provider's `fromMe` flag.
    pub fn from_me(from_me: bool) -> Self {
        if from_me {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical media type of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum MediaType {
    Text,
    Image,
    Video,
    Audio,
    Document,
    Sticker,
    Contact,
}

impl MediaType {
    pub const ALL: [MediaType; 7] = [
        MediaType::Text,
        MediaType::Image,
        MediaType::Video,
        MediaType::Audio,
        MediaType::Document,
        MediaType::Sticker,
        MediaType::Contact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Text => "text",
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Document => "document",
            MediaType::Sticker => "sticker",
            MediaType::Contact => "contact",
        }
    }

    /// Whether the message carries a binary asset hosted by the provider.
    pub fn has_binary_asset(&self) -> bool {
        !matches!(self, MediaType::Text | MediaType::Contact)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown media type: {}", s))
    }
}

/// An ingested message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub direction: Direction,
    pub content: Option<String>,
    pub media_type: MediaType,
    /// Durable URL, or a JSON blob for contact cards.
    pub media_url: Option<String>,
    /// Provider-assigned id; unique when present.
    pub external_id: Option<String>,
    /// Attached later by the transcription service.
    pub transcription: Option<String>,
    pub created_at: String,
}

/// Fields required to insert a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: String,
    pub direction: Direction,
    pub content: Option<String>,
    pub media_type: MediaType,
    pub media_url: Option<String>,
    pub external_id: Option<String>,
    pub created_at: String,
}

/// A per-instance list of leads collected from inbound traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LeadList {
    pub id: String,
    pub instance_id: String,
    pub name: String,
    pub created_at: String,
}

/// A single lead in a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LeadListEntry {
    pub list_id: String,
    pub phone: String,
    pub name: Option<String>,
    pub created_at: String,
}
