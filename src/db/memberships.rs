use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{MemberDetail, Membership};

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Uuid,
    role: &str,
) -> Result<Membership, sqlx::Error> {
    sqlx::query_as::<_, Membership>(
        "INSERT INTO memberships (user_id, organization_id, role)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(organization_id)
    .bind(role)
    .fetch_one(pool)
    .await
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Membership>, sqlx::Error> {
    sqlx::query_as::<_, Membership>(
        "SELECT * FROM memberships WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn find(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Uuid,
) -> Result<Option<Membership>, sqlx::Error> {
    sqlx::query_as::<_, Membership>(
        "SELECT * FROM memberships WHERE user_id = $1 AND organization_id = $2",
    )
    .bind(user_id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await
}

/// Member listing for the in-app team page. Owners are excluded: they manage
/// the organization rather than appear in their own staff list.
pub async fn list_members(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<MemberDetail>, sqlx::Error> {
    sqlx::query_as::<_, MemberDetail>(
        "SELECT m.id, m.user_id, m.organization_id, m.role, u.name, u.email, u.image_url, m.created_at
         FROM memberships m
         JOIN users u ON u.id = m.user_id
         WHERE m.organization_id = $1 AND m.role <> 'owner'
         ORDER BY m.created_at ASC",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
}

/// Full roster including owners, for the platform admin surface.
pub async fn list_all_members(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<MemberDetail>, sqlx::Error> {
    sqlx::query_as::<_, MemberDetail>(
        "SELECT m.id, m.user_id, m.organization_id, m.role, u.name, u.email, u.image_url, m.created_at
         FROM memberships m
         JOIN users u ON u.id = m.user_id
         WHERE m.organization_id = $1
         ORDER BY m.created_at ASC",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
}

pub async fn count_owners(pool: &PgPool, organization_id: Uuid) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM memberships WHERE organization_id = $1 AND role = 'owner'",
    )
    .bind(organization_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn update_role(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Uuid,
    role: &str,
) -> Result<Option<Membership>, sqlx::Error> {
    sqlx::query_as::<_, Membership>(
        "UPDATE memberships SET role = $3, updated_at = now()
         WHERE user_id = $1 AND organization_id = $2 RETURNING *",
    )
    .bind(user_id)
    .bind(organization_id)
    .bind(role)
    .fetch_optional(pool)
    .await
}

pub async fn delete(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM memberships WHERE user_id = $1 AND organization_id = $2",
    )
    .bind(user_id)
    .bind(organization_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
