//! Per-instance lead lists fed from inbound traffic.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{LeadList, LeadListEntry};

/// What [`add_lead`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadOutcome {
    /// A new entry was appended.
    Added,
    /// The entry existed without a name and was back-filled.
    NameFilled,
    /// The entry existed already; nothing changed.
    AlreadyPresent,
}

/// Get the named list for an instance, creating it on first use.
pub async fn ensure_list(pool: &SqlitePool, instance_id: &str, name: &str) -> Result<LeadList> {
    sqlx::query(
        r#"
        INSERT INTO lead_lists (id, instance_id, name, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(instance_id, name) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(instance_id)
    .bind(name)
    .bind(crate::now())
    .execute(pool)
    .await?;

    sqlx::query_as::<_, LeadList>(
        r#"
        SELECT id, instance_id, name, created_at
        FROM lead_lists
        WHERE instance_id = ? AND name = ?
        "#,
    )
    .bind(instance_id)
    .bind(name)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "LeadList",
        id: format!("{}/{}", instance_id, name),
    })
}

/// Append a lead to a list, skipping phones already present.
pub async fn add_lead(
    pool: &SqlitePool,
    list_id: &str,
    phone: &str,
    name: Option<&str>,
) -> Result<LeadOutcome> {
    let name = name.filter(|n| !n.trim().is_empty());

    let inserted = sqlx::query(
        r#"
        INSERT INTO lead_list_entries (list_id, phone, name, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(list_id, phone) DO NOTHING
        "#,
    )
    .bind(list_id)
    .bind(phone)
    .bind(name)
    .bind(crate::now())
    .execute(pool)
    .await?;

    if inserted.rows_affected() > 0 {
        return Ok(LeadOutcome::Added);
    }

    let Some(name) = name else {
        return Ok(LeadOutcome::AlreadyPresent);
    };

    let filled = sqlx::query(
        r#"
        UPDATE lead_list_entries
        SET name = ?
        WHERE list_id = ? AND phone = ? AND (name IS NULL OR trim(name) = '')
        "#,
    )
    .bind(name)
    .bind(list_id)
    .bind(phone)
    .execute(pool)
    .await?;

    if filled.rows_affected() > 0 {
        Ok(LeadOutcome::NameFilled)
    } else {
        Ok(LeadOutcome::AlreadyPresent)
    }
}

/// List entries of a lead list, oldest first.
pub async fn list_leads(pool: &SqlitePool, list_id: &str) -> Result<Vec<LeadListEntry>> {
    let entries = sqlx::query_as::<_, LeadListEntry>(
        r#"
        SELECT list_id, phone, name, created_at
        FROM lead_list_entries
        WHERE list_id = ?
        ORDER BY created_at, phone
        "#,
    )
    .bind(list_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
