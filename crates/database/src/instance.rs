//! Instance (tenant) lookups.
//!
//! Instances are provisioned outside the ingestion pipeline; the only write
//! here is [`create_instance`], used by provisioning tooling and tests.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Instance;

/// Create a new instance.
pub async fn create_instance(pool: &SqlitePool, instance: &Instance) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO instances (id, name, owner, token)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&instance.id)
    .bind(&instance.name)
    .bind(&instance.owner)
    .bind(&instance.token)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Instance", &instance.id))?;

    Ok(())
}

/// Get an instance by ID.
pub async fn get_instance(pool: &SqlitePool, id: &str) -> Result<Instance> {
    find_instance_by_id(pool, id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Instance",
            id: id.to_string(),
        })
}

/// Find an instance by ID.
pub async fn find_instance_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Instance>> {
    let instance = sqlx::query_as::<_, Instance>(
        r#"
        SELECT id, name, owner, token
        FROM instances
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(instance)
}

/// Find the first instance whose id, name, or owner equals `identifier`.
pub async fn find_instance_by_identifier(
    pool: &SqlitePool,
    identifier: &str,
) -> Result<Option<Instance>> {
    let instance = sqlx::query_as::<_, Instance>(
        r#"
        SELECT id, name, owner, token
        FROM instances
        WHERE id = ?1 OR name = ?1 OR owner = ?1
        ORDER BY CASE WHEN id = ?1 THEN 0 WHEN name = ?1 THEN 1 ELSE 2 END
        LIMIT 1
        "#,
    )
    .bind(identifier)
    .fetch_optional(pool)
    .await?;

    Ok(instance)
}

/// Get the auth token of the instance bound to an inbox.
///
/// Returns `None` when the inbox or instance is missing, or has no token.
pub async fn token_for_inbox(pool: &SqlitePool, inbox_id: &str) -> Result<Option<(Instance, String)>> {
    let instance = sqlx::query_as::<_, Instance>(
        r#"
        SELECT i.id, i.name, i.owner, i.token
        FROM instances i
        INNER JOIN inboxes b ON b.instance_id = i.id
        WHERE b.id = ?
        "#,
    )
    .bind(inbox_id)
    .fetch_optional(pool)
    .await?;

    Ok(instance.map(|i| {
        let token = i.token.clone().unwrap_or_default();
        (i, token)
    }))
}
