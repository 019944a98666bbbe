use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Invitation, InvitationDetail};

pub async fn create(
    pool: &PgPool,
    organization_id: Uuid,
    inviter_id: Uuid,
    email: &str,
    role: &str,
    expires_at: DateTime<Utc>,
) -> Result<Invitation, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(
        "INSERT INTO invitations (organization_id, inviter_id, email, role, expires_at)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(organization_id)
    .bind(inviter_id)
    .bind(email)
    .bind(role)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Invitation>, sqlx::Error> {
    sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_pending(
    pool: &PgPool,
    organization_id: Uuid,
    email: &str,
) -> Result<Option<Invitation>, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(
        "SELECT * FROM invitations
         WHERE organization_id = $1 AND email = $2 AND status = 'pending' AND expires_at > now()",
    )
    .bind(organization_id)
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn list_pending_for_organization(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<Invitation>, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(
        "SELECT * FROM invitations
         WHERE organization_id = $1 AND status = 'pending' AND expires_at > now()
         ORDER BY created_at DESC",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
}

/// Pending, unexpired invitations addressed to an email, joined with the
/// organization and inviter names for display.
pub async fn list_pending_for_email(
    pool: &PgPool,
    email: &str,
) -> Result<Vec<InvitationDetail>, sqlx::Error> {
    sqlx::query_as::<_, InvitationDetail>(
        "SELECT i.id, i.organization_id, o.name AS organization_name, u.name AS inviter_name,
                i.email, i.role, i.status, i.expires_at, i.created_at
         FROM invitations i
         JOIN organizations o ON o.id = i.organization_id
         JOIN users u ON u.id = i.inviter_id
         WHERE i.email = $1 AND i.status = 'pending' AND i.expires_at > now()
         ORDER BY i.created_at DESC",
    )
    .bind(email)
    .fetch_all(pool)
    .await
}

/// Flips a pending invitation to a terminal status. Returns None when the
/// invitation was already decided, so concurrent accept/cancel races resolve
/// to exactly one winner.
pub async fn mark_status(
    pool: &PgPool,
    id: Uuid,
    status: &str,
) -> Result<Option<Invitation>, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(
        "UPDATE invitations SET status = $2 WHERE id = $1 AND status = 'pending' RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_optional(pool)
    .await
}
