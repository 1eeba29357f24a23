//! Tenant and inbox resolution.

use database::{inbox, instance, Database, Instance};
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::payload::IdentityHint;

/// Address suffix used by the provider for personal accounts.
const USER_SUFFIX: &str = "@s.whatsapp.net";

/// A tenant resolved far enough to ingest into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// `None` on the fast path when the inbox's tenant is missing.
    pub instance_id: Option<String>,
    pub inbox_id: String,
    /// Provider token; empty when unknown, which disables media resolution.
    pub token: String,
    pub owner: Option<String>,
}

/// Result of identity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOutcome {
    Resolved(ResolvedIdentity),
    InstanceNotFound,
    NoInbox,
}

/// Resolve a delivery's tenant and inbox.
///
/// With an inbox already known only its existence and the token are looked
/// up; an unknown inbox is `NoInbox` and a missing tenant yields an empty
/// token. Otherwise the instance identifier is matched
/// against id, name, and owner.
pub async fn resolve(db: &Database, hint: &IdentityHint) -> Result<IdentityOutcome> {
    if let Some(inbox_id) = &hint.inbox_id {
        return resolve_fast(db, inbox_id, hint).await;
    }

    let identifier = hint
        .instance
        .as_deref()
        .or(hint.owner.as_deref())
        .ok_or(IngestError::MissingInstance)?;

    let Some(found) = find_instance(db, identifier, hint.owner.as_deref()).await? else {
        return Ok(IdentityOutcome::InstanceNotFound);
    };

    let Some(bound) = inbox::find_inbox_for_instance(db.pool(), &found.id).await? else {
        return Ok(IdentityOutcome::NoInbox);
    };

    Ok(IdentityOutcome::Resolved(ResolvedIdentity {
        instance_id: Some(found.id),
        inbox_id: bound.id,
        token: found.token.unwrap_or_default(),
        owner: found.owner.or_else(|| hint.owner.clone()),
    }))
}

async fn resolve_fast(db: &Database, inbox_id: &str, hint: &IdentityHint) -> Result<IdentityOutcome> {
    if inbox::find_inbox(db.pool(), inbox_id).await?.is_none() {
        debug!(inbox_id, "Inbox from delivery does not exist");
        return Ok(IdentityOutcome::NoInbox);
    }

    let resolved = match instance::token_for_inbox(db.pool(), inbox_id).await? {
        Some((found, token)) => ResolvedIdentity {
            instance_id: Some(found.id),
            inbox_id: inbox_id.to_string(),
            token,
            owner: found.owner.or_else(|| hint.owner.clone()),
        },
        None => {
            debug!(inbox_id, "No tenant bound to inbox, continuing without token");
            ResolvedIdentity {
                instance_id: None,
                inbox_id: inbox_id.to_string(),
                token: String::new(),
                owner: hint.owner.clone(),
            }
        }
    };

    Ok(IdentityOutcome::Resolved(resolved))
}

/// Try the identifier as given, without its address suffix, and with the
/// personal-account suffix; then the owner address the same way.
async fn find_instance(db: &Database, identifier: &str, owner: Option<&str>) -> Result<Option<Instance>> {
    let mut candidates = candidates_for(identifier);
    if let Some(owner) = owner {
        for candidate in candidates_for(owner) {
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    for candidate in &candidates {
        if let Some(found) = instance::find_instance_by_identifier(db.pool(), candidate).await? {
            return Ok(Some(found));
        }
    }

    Ok(None)
}

fn candidates_for(identifier: &str) -> Vec<String> {
    let raw = identifier.trim();
    let bare = raw.split('@').next().unwrap_or(raw);
    let mut candidates = vec![raw.to_string()];
    for candidate in [bare.to_string(), format!("{}{}", bare, USER_SUFFIX)] {
        if !bare.is_empty() && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}
