//! Acknowledged ingestion outcomes.

use std::fmt;

use serde_json::{json, Value};

/// Why a delivery was acknowledged without storing a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    NotMessageEvent,
    Group,
    Duplicate,
    /// Caught by the storage uniqueness constraint rather than the pre-check.
    DuplicateIndex,
    NoInsert,
    InstanceNotFound,
    NoInbox,
    StatusIaInvalid,
    StatusIaNoChat,
    StatusIaNoConversation,
    StatusIaInstanceNotFound,
    StatusIaNoInbox,
}

impl SkipReason {
    /// Stable reason code reported to callers and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotMessageEvent => "not_message_event",
            SkipReason::Group => "group",
            SkipReason::Duplicate => "duplicate",
            SkipReason::DuplicateIndex => "duplicate_index",
            SkipReason::NoInsert => "no_insert",
            SkipReason::InstanceNotFound => "instance_not_found",
            SkipReason::NoInbox => "no_inbox",
            SkipReason::StatusIaInvalid => "status_ia_invalid",
            SkipReason::StatusIaNoChat => "status_ia_no_chat",
            SkipReason::StatusIaNoConversation => "status_ia_no_conversation",
            SkipReason::StatusIaInstanceNotFound => "status_ia_instance_not_found",
            SkipReason::StatusIaNoInbox => "status_ia_no_inbox",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason code for a successfully applied status-only delivery.
pub const STATUS_UPDATED: &str = "status_ia_updated";

/// What an ingestion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A message was persisted.
    Stored {
        conversation_id: String,
        message_id: String,
    },
    /// Only the assistant flag changed.
    StatusOnly {
        conversation_id: String,
        enabled: bool,
    },
    Skipped(SkipReason),
}

impl Outcome {
    /// Reason code when nothing was stored.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Outcome::Stored { .. } => None,
            Outcome::StatusOnly { .. } => Some(STATUS_UPDATED),
            Outcome::Skipped(reason) => Some(reason.as_str()),
        }
    }

    /// Response body for the webhook caller.
    pub fn to_json(&self) -> Value {
        match self {
            Outcome::Stored {
                conversation_id,
                message_id,
            } => json!({
                "ok": true,
                "conversation_id": conversation_id,
                "message_id": message_id,
            }),
            Outcome::StatusOnly {
                conversation_id,
                enabled,
            } => json!({
                "ok": true,
                "skipped": true,
                "reason": STATUS_UPDATED,
                "conversation_id": conversation_id,
                "status_ia": enabled,
            }),
            Outcome::Skipped(reason) => json!({
                "ok": true,
                "skipped": true,
                "reason": reason.as_str(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_json() {
        let body = Outcome::Skipped(SkipReason::Duplicate).to_json();
        assert_eq!(body, json!({"ok": true, "skipped": true, "reason": "duplicate"}));
    }

    #[test]
    fn test_stored_json() {
        let body = Outcome::Stored {
            conversation_id: "c1".to_string(),
            message_id: "m1".to_string(),
        }
        .to_json();
        assert_eq!(body["ok"], true);
        assert_eq!(body["conversation_id"], "c1");
        assert!(body.get("skipped").is_none());
    }

    #[test]
    fn test_status_only_reports_updated() {
        let outcome = Outcome::StatusOnly {
            conversation_id: "c1".to_string(),
            enabled: false,
        };
        assert_eq!(outcome.reason(), Some("status_ia_updated"));
        assert_eq!(outcome.to_json()["status_ia"], false);
    }

    #[test]
    fn test_reason_codes_are_prefixed_for_status() {
        for reason in [
            SkipReason::StatusIaInvalid,
            SkipReason::StatusIaNoChat,
            SkipReason::StatusIaNoConversation,
            SkipReason::StatusIaInstanceNotFound,
            SkipReason::StatusIaNoInbox,
        ] {
            assert!(reason.as_str().starts_with("status_ia_"));
        }
    }
}
