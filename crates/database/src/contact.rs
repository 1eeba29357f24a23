//! Contact upserts.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::Contact;

/// Find a contact by provider address.
pub async fn find_contact_by_jid(pool: &SqlitePool, jid: &str) -> Result<Option<Contact>> {
    let contact = sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, jid, phone, name, created_at
        FROM contacts
        WHERE jid = ?
        "#,
    )
    .bind(jid)
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}

/// Get or create the contact for `jid`.
///
/// Concurrent callers converge on the same row: the insert is a no-op on
/// conflict and the row is re-read afterwards. An existing name is never
/// replaced; a missing one is back-filled from `name`.
pub async fn upsert_contact(
    pool: &SqlitePool,
    jid: &str,
    phone: Option<&str>,
    name: Option<&str>,
) -> Result<Contact> {
    if let Some(existing) = find_contact_by_jid(pool, jid).await? {
        return backfill_name(pool, existing, name).await;
    }

    sqlx::query(
        r#"
        INSERT INTO contacts (id, jid, phone, name, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(jid) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(jid)
    .bind(phone)
    .bind(name)
    .bind(crate::now())
    .execute(pool)
    .await?;

    let contact = find_contact_by_jid(pool, jid)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Contact",
            id: jid.to_string(),
        })?;

    // Lost the insert race to a caller that had no name.
    backfill_name(pool, contact, name).await
}

async fn backfill_name(pool: &SqlitePool, mut contact: Contact, name: Option<&str>) -> Result<Contact> {
    let has_name = contact.name.as_deref().is_some_and(|n| !n.trim().is_empty());
    let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
        return Ok(contact);
    };
    if has_name {
        return Ok(contact);
    }

    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET name = ?
        WHERE id = ? AND (name IS NULL OR trim(name) = '')
        "#,
    )
    .bind(name)
    .bind(&contact.id)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        tracing::debug!(contact_id = %contact.id, "Back-filled contact name");
        contact.name = Some(name.to_string());
    }

    Ok(contact)
}

/// Set a contact's name unconditionally (agent edits).
pub async fn rename_contact(pool: &SqlitePool, id: &str, name: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET name = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Contact",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Count total contacts.
pub async fn count_contacts(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM contacts
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
