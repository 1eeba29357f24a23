//! Conversation threading.
//!
//! A conversation is "current" while its status is open or pending. New
//! traffic for an (inbox, contact) pair attaches to the most recent current
//! conversation; a partial unique index keeps at most one of them per pair.

use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Conversation, ConversationStatus};

const COLUMNS: &str = "id, inbox_id, contact_id, status, priority, unread, assistant_enabled, \
                       last_message_at, last_message_preview, created_at";

/// Get a conversation by ID.
pub async fn get_conversation(pool: &SqlitePool, id: &str) -> Result<Conversation> {
    let sql = format!("SELECT {COLUMNS} FROM conversations WHERE id = ?");
    sqlx::query_as::<_, Conversation>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Conversation",
            id: id.to_string(),
        })
}

/// Find the most recent open or pending conversation for a pair.
pub async fn find_current(
    pool: &SqlitePool,
    inbox_id: &str,
    contact_id: &str,
) -> Result<Option<Conversation>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM conversations \
         WHERE inbox_id = ? AND contact_id = ? AND status IN ('open', 'pending') \
         ORDER BY last_message_at DESC, created_at DESC \
         LIMIT 1"
    );
    let conversation = sqlx::query_as::<_, Conversation>(&sql)
        .bind(inbox_id)
        .bind(contact_id)
        .fetch_optional(pool)
        .await?;

    Ok(conversation)
}

/// Find the current conversation for a pair, opening a new one if none exists.
///
/// Returns the conversation and whether it was created by this call.
pub async fn find_or_open(
    pool: &SqlitePool,
    inbox_id: &str,
    contact_id: &str,
    at: &str,
) -> Result<(Conversation, bool)> {
    if let Some(existing) = find_current(pool, inbox_id, contact_id).await? {
        return Ok((existing, false));
    }

    let id = Uuid::new_v4().to_string();
    let result = sqlx::query(
        r#"
        INSERT INTO conversations
            (id, inbox_id, contact_id, status, priority, unread, last_message_at, created_at)
        VALUES (?, ?, ?, 'open', 'normal', 1, ?, ?)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(&id)
    .bind(inbox_id)
    .bind(contact_id)
    .bind(at)
    .bind(crate::now())
    .execute(pool)
    .await?;

    let created = result.rows_affected() > 0;
    if !created {
        tracing::debug!(inbox_id, contact_id, "Conversation opened concurrently, reusing");
    }

    let conversation = find_current(pool, inbox_id, contact_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Conversation",
            id: format!("{}/{}", inbox_id, contact_id),
        })?;

    Ok((conversation, created))
}

/// Record the latest message on a conversation.
///
/// `mark_unread` is only ever set for incoming traffic; outgoing messages
/// leave the read flag as it is.
pub async fn record_message<'e, E>(
    executor: E,
    id: &str,
    at: &str,
    preview: &str,
    mark_unread: bool,
) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET last_message_at = ?,
            last_message_preview = ?,
            unread = CASE WHEN ? THEN 1 ELSE unread END
        WHERE id = ?
        "#,
    )
    .bind(at)
    .bind(preview)
    .bind(mark_unread)
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Conversation",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Set the assistant flag. Idempotent.
pub async fn set_assistant_enabled<'e, E>(executor: E, id: &str, enabled: bool) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET assistant_enabled = ?
        WHERE id = ?
        "#,
    )
    .bind(enabled)
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Conversation",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Change a conversation's status. Driven by agents, never by ingestion.
pub async fn set_status(pool: &SqlitePool, id: &str, status: ConversationStatus) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET status = ?
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Conversation",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all conversations for a pair, most recent first.
pub async fn list_for_contact(
    pool: &SqlitePool,
    inbox_id: &str,
    contact_id: &str,
) -> Result<Vec<Conversation>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM conversations \
         WHERE inbox_id = ? AND contact_id = ? \
         ORDER BY created_at DESC"
    );
    let conversations = sqlx::query_as::<_, Conversation>(&sql)
        .bind(inbox_id)
        .bind(contact_id)
        .fetch_all(pool)
        .await?;

    Ok(conversations)
}
