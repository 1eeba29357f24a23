//! Contact and conversation resolution.

use database::{contact, conversation, Contact, Database};
use tracing::info;

use crate::error::Result;
use crate::normalize::NormalizedMessage;

/// The contact and conversation a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub contact: Contact,
    pub conversation_id: String,
    /// The conversation was opened by this delivery.
    pub opened: bool,
}

/// Digits of the address's local part, e.g. `5511999` for `5511999@x`.
pub fn phone_from_jid(jid: &str) -> Option<String> {
    let local = jid.split('@').next().unwrap_or(jid);
    let local = local.split(':').next().unwrap_or(local);
    let digits: String = local.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

/// Upsert the contact and find or open its current conversation.
///
/// `known_conversation` comes from a status update in the same delivery and
/// is reused as is.
pub async fn resolve_thread(
    db: &Database,
    inbox_id: &str,
    msg: &NormalizedMessage,
    known_conversation: Option<&str>,
) -> Result<Thread> {
    let phone = phone_from_jid(&msg.chat_id);
    let contact = contact::upsert_contact(
        db.pool(),
        &msg.chat_id,
        phone.as_deref(),
        msg.sender_name.as_deref(),
    )
    .await?;

    if let Some(conversation_id) = known_conversation {
        return Ok(Thread {
            contact,
            conversation_id: conversation_id.to_string(),
            opened: false,
        });
    }

    let at = database::timestamp(msg.timestamp);
    let (current, opened) = conversation::find_or_open(db.pool(), inbox_id, &contact.id, &at).await?;
    if opened {
        info!(conversation_id = %current.id, contact_id = %contact.id, "Conversation opened");
    }

    Ok(Thread {
        contact,
        conversation_id: current.id,
        opened,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_from_jid() {
        assert_eq!(phone_from_jid("5511999@s.whatsapp.net").as_deref(), Some("5511999"));
        assert_eq!(phone_from_jid("+55 11 999").as_deref(), Some("5511999"));
        assert_eq!(phone_from_jid("5511999:12@s.whatsapp.net").as_deref(), Some("5511999"));
        assert_eq!(phone_from_jid("abc@lid"), None);
    }
}
