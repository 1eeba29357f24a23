//! Message persistence.

use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Message, NewMessage};

/// Find a message whose external id equals `external_id` or any of
/// `legacy_ids`.
pub async fn find_by_external_id(
    pool: &SqlitePool,
    external_id: &str,
    legacy_ids: &[String],
) -> Result<Option<Message>> {
    let placeholders = vec!["?"; legacy_ids.len() + 1].join(", ");
    let sql = format!(
        "SELECT id, conversation_id, direction, content, media_type, media_url, \
                external_id, transcription, created_at \
         FROM messages \
         WHERE external_id IN ({placeholders}) \
         LIMIT 1"
    );

    let mut query = sqlx::query_as::<_, Message>(&sql).bind(external_id);
    for legacy_id in legacy_ids {
        query = query.bind(legacy_id);
    }

    Ok(query.fetch_optional(pool).await?)
}

/// Insert a message.
///
/// A duplicate external id surfaces as [`DatabaseError::AlreadyExists`].
/// `Ok(None)` means the statement completed without producing a row.
/// Runs on a pool or inside a caller's transaction.
pub async fn insert_message<'e, E>(executor: E, new: &NewMessage) -> Result<Option<Message>>
where
    E: SqliteExecutor<'e>,
{
    let id = Uuid::new_v4().to_string();
    let message = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages
            (id, conversation_id, direction, content, media_type, media_url, external_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, conversation_id, direction, content, media_type, media_url,
                  external_id, transcription, created_at
        "#,
    )
    .bind(&id)
    .bind(&new.conversation_id)
    .bind(new.direction)
    .bind(&new.content)
    .bind(new.media_type)
    .bind(&new.media_url)
    .bind(&new.external_id)
    .bind(&new.created_at)
    .fetch_optional(executor)
    .await
    .map_err(|e| {
        DatabaseError::from_insert(e, "Message", new.external_id.as_deref().unwrap_or(&id))
    })?;

    Ok(message)
}

/// Attach a transcription result to a message.
pub async fn set_transcription(pool: &SqlitePool, id: &str, transcription: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET transcription = ?
        WHERE id = ?
        "#,
    )
    .bind(transcription)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Message",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Get a message by ID.
pub async fn get_message(pool: &SqlitePool, id: &str) -> Result<Message> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT id, conversation_id, direction, content, media_type, media_url,
               external_id, transcription, created_at
        FROM messages
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Message",
        id: id.to_string(),
    })
}

/// List a conversation's messages, oldest first.
pub async fn list_for_conversation(pool: &SqlitePool, conversation_id: &str) -> Result<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, conversation_id, direction, content, media_type, media_url,
               external_id, transcription, created_at
        FROM messages
        WHERE conversation_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// Count messages carrying an external id.
pub async fn count_by_external_id(pool: &SqlitePool, external_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages WHERE external_id = ?
        "#,
    )
    .bind(external_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Count total messages.
pub async fn count_messages(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
