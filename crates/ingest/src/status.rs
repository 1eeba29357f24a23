//! Status-channel merging.
//!
//! A status update toggles the assistant flag on the contact's current
//! conversation. Identity resolved here is handed on to any message that
//! arrived in the same delivery.

use database::{contact, conversation, Database};
use tracing::info;

use crate::error::Result;
use crate::identity::{self, IdentityOutcome, ResolvedIdentity};
use crate::outcome::SkipReason;
use crate::payload::StatusUpdate;

/// Result of applying a status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMerge {
    Applied {
        identity: ResolvedIdentity,
        conversation_id: String,
        enabled: bool,
    },
    /// Nothing changed. `identity` is set when resolution got that far.
    Unapplied {
        identity: Option<ResolvedIdentity>,
        reason: SkipReason,
    },
}

/// Apply a status update to the current conversation of its chat.
pub async fn merge(db: &Database, update: &StatusUpdate) -> Result<StatusMerge> {
    let identity = match identity::resolve(db, &update.identity).await? {
        IdentityOutcome::Resolved(identity) => identity,
        IdentityOutcome::InstanceNotFound => {
            return Ok(unapplied(None, SkipReason::StatusIaInstanceNotFound))
        }
        IdentityOutcome::NoInbox => return Ok(unapplied(None, SkipReason::StatusIaNoInbox)),
    };

    let Some(enabled) = update.signal.enabled() else {
        info!(value = %update.signal.raw, "Unrecognized status value");
        return Ok(unapplied(Some(identity), SkipReason::StatusIaInvalid));
    };

    let Some(chat_id) = update.chat_id.as_deref() else {
        return Ok(unapplied(Some(identity), SkipReason::StatusIaNoChat));
    };

    let Some(found) = contact::find_contact_by_jid(db.pool(), chat_id).await? else {
        return Ok(unapplied(Some(identity), SkipReason::StatusIaNoConversation));
    };

    let Some(current) = conversation::find_current(db.pool(), &identity.inbox_id, &found.id).await? else {
        return Ok(unapplied(Some(identity), SkipReason::StatusIaNoConversation));
    };

    conversation::set_assistant_enabled(db.pool(), &current.id, enabled).await?;
    info!(conversation_id = %current.id, enabled, "Assistant status updated");

    Ok(StatusMerge::Applied {
        identity,
        conversation_id: current.id,
        enabled,
    })
}

fn unapplied(identity: Option<ResolvedIdentity>, reason: SkipReason) -> StatusMerge {
    StatusMerge::Unapplied { identity, reason }
}
