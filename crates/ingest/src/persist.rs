//! Message and conversation writes.

use database::{
    conversation, message, Database, DatabaseError, Direction, MediaType, Message, NewMessage,
};
use tracing::{error, warn};

use crate::error::Result;
use crate::normalize::NormalizedMessage;
use crate::resolver::Thread;

/// Result of writing a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    Inserted(Message),
    /// The external id unique index rejected the row.
    Duplicate,
    /// The insert completed without producing a row.
    NoInsert,
}

/// Preview text shown in conversation lists.
pub fn preview(media_type: MediaType, content: Option<&str>) -> String {
    let label = match media_type {
        MediaType::Text => return content.unwrap_or_default().to_string(),
        MediaType::Image => "📷 Image",
        MediaType::Video => "🎥 Video",
        MediaType::Audio => "🎤 Audio",
        MediaType::Document => "📄 Document",
        MediaType::Sticker => "🏷️ Sticker",
        MediaType::Contact => "👤 Contact",
    };
    label.to_string()
}

/// Insert the message and bring its conversation up to date.
///
/// All writes share one transaction, so a failed conversation update leaves
/// no message behind and a redelivery can store it again. `status` is an
/// assistant flag still to be written, if any.
pub async fn persist(
    db: &Database,
    thread: &Thread,
    msg: &NormalizedMessage,
    status: Option<bool>,
) -> Result<Persisted> {
    let created_at = database::timestamp(msg.timestamp);
    let new = NewMessage {
        conversation_id: thread.conversation_id.clone(),
        direction: msg.direction,
        content: msg.content.clone(),
        media_type: msg.media_type,
        media_url: msg.media_url.clone(),
        external_id: msg.external_id.clone(),
        created_at: created_at.clone(),
    };

    let mut tx = db.begin().await?;

    let inserted = match message::insert_message(&mut *tx, &new).await {
        Ok(Some(inserted)) => inserted,
        Ok(None) => {
            warn!(conversation_id = %thread.conversation_id, "Message insert returned no row");
            return Ok(Persisted::NoInsert);
        }
        Err(e) if e.is_already_exists() => return Ok(Persisted::Duplicate),
        Err(e) => {
            error!(conversation_id = %thread.conversation_id, error = %e, "Message insert failed");
            return Err(e.into());
        }
    };

    conversation::record_message(
        &mut *tx,
        &thread.conversation_id,
        &created_at,
        &preview(msg.media_type, msg.content.as_deref()),
        msg.direction == Direction::Incoming,
    )
    .await?;

    if let Some(enabled) = status {
        conversation::set_assistant_enabled(&mut *tx, &thread.conversation_id, enabled).await?;
    }

    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(Persisted::Inserted(inserted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_labels() {
        assert_eq!(preview(MediaType::Text, Some("Hello")), "Hello");
        assert_eq!(preview(MediaType::Text, None), "");
        assert_eq!(preview(MediaType::Image, Some("caption")), "📷 Image");
        assert_eq!(preview(MediaType::Audio, None), "🎤 Audio");
        for media_type in MediaType::ALL {
            if media_type != MediaType::Text {
                assert!(!preview(media_type, None).is_empty());
            }
        }
    }
}
