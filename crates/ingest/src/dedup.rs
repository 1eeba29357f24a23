//! Redelivery detection.
//!
//! This is a pre-check only. The unique index on `messages.external_id` is
//! the authoritative guard; a violation there is reported the same way.

use database::{message, Database};

use crate::error::Result;
use crate::normalize::NormalizedMessage;

/// Whether a message with this external id, or its legacy
/// `<owner>:<id>` form, was already ingested.
pub async fn is_duplicate(db: &Database, msg: &NormalizedMessage) -> Result<bool> {
    let Some(external_id) = msg.external_id.as_deref() else {
        return Ok(false);
    };
    let legacy = msg.legacy_external_ids();

    let existing = message::find_by_external_id(db.pool(), external_id, &legacy).await?;
    Ok(existing.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use database::{contact, conversation, Direction, MediaType, NewMessage};

    fn normalized(raw_id: &str, owner: Option<&str>) -> NormalizedMessage {
        NormalizedMessage {
            chat_id: "1@x".to_string(),
            direction: Direction::Incoming,
            external_id: raw_id.rsplit(':').next().map(str::to_string),
            raw_external_id: Some(raw_id.to_string()),
            media_type: MediaType::Text,
            content: Some("hi".to_string()),
            media_url: None,
            mimetype: None,
            file_name: None,
            sender_name: None,
            owner: owner.map(str::to_string),
            timestamp: Utc::now(),
            is_group: false,
        }
    }

    async fn store(db: &Database, external_id: &str) {
        let c = contact::upsert_contact(db.pool(), "1@x", Some("1"), None).await.unwrap();
        let (conv, _) = conversation::find_or_open(db.pool(), "inbox-1", &c.id, &database::now())
            .await
            .unwrap();
        message::insert_message(
            db.pool(),
            &NewMessage {
                conversation_id: conv.id,
                direction: Direction::Incoming,
                content: None,
                media_type: MediaType::Text,
                media_url: None,
                external_id: Some(external_id.to_string()),
                created_at: database::now(),
            },
        )
        .await
        .unwrap();
    }

    async fn db_with_inbox() -> Database {
        use database::{inbox, instance, Inbox, Instance};
        let db = Database::in_memory().await.unwrap();
        instance::create_instance(
            db.pool(),
            &Instance {
                id: "inst-1".to_string(),
                name: "acct1".to_string(),
                owner: None,
                token: None,
            },
        )
        .await
        .unwrap();
        inbox::create_inbox(
            db.pool(),
            &Inbox {
                id: "inbox-1".to_string(),
                instance_id: "inst-1".to_string(),
            },
        )
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_plain_id_hit() {
        let db = db_with_inbox().await;
        store(&db, "ABC").await;
        assert!(is_duplicate(&db, &normalized("ABC", None)).await.unwrap());
        assert!(!is_duplicate(&db, &normalized("XYZ", None)).await.unwrap());
    }

    #[tokio::test]
    async fn test_legacy_composite_hit() {
        let db = db_with_inbox().await;
        store(&db, "5511000:ABC").await;
        assert!(is_duplicate(&db, &normalized("ABC", Some("5511000"))).await.unwrap());
        assert!(!is_duplicate(&db, &normalized("ABC", Some("5511999"))).await.unwrap());
    }

    #[tokio::test]
    async fn test_prefixed_raw_id_checks_owner_form() {
        let db = db_with_inbox().await;
        store(&db, "5511000:123").await;
        assert!(is_duplicate(&db, &normalized("abc:123", Some("5511000"))).await.unwrap());
        assert!(!is_duplicate(&db, &normalized("abc:123", None)).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_id_is_never_duplicate() {
        let db = db_with_inbox().await;
        let mut msg = normalized("ABC", None);
        msg.external_id = None;
        msg.raw_external_id = None;
        assert!(!is_duplicate(&db, &msg).await.unwrap());
    }
}
