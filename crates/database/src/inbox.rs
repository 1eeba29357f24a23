//! Inbox bindings.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Inbox;

/// Bind a new inbox to an instance.
pub async fn create_inbox(pool: &SqlitePool, inbox: &Inbox) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO inboxes (id, instance_id)
        VALUES (?, ?)
        "#,
    )
    .bind(&inbox.id)
    .bind(&inbox.instance_id)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Inbox", &inbox.id))?;

    Ok(())
}

/// Find the inbox bound to an instance.
pub async fn find_inbox_for_instance(pool: &SqlitePool, instance_id: &str) -> Result<Option<Inbox>> {
    let inbox = sqlx::query_as::<_, Inbox>(
        r#"
        SELECT id, instance_id
        FROM inboxes
        WHERE instance_id = ?
        "#,
    )
    .bind(instance_id)
    .fetch_optional(pool)
    .await?;

    Ok(inbox)
}

/// Find an inbox by ID.
pub async fn find_inbox(pool: &SqlitePool, id: &str) -> Result<Option<Inbox>> {
    let inbox = sqlx::query_as::<_, Inbox>(
        r#"
        SELECT id, instance_id
        FROM inboxes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(inbox)
}
