use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::EmailToken;

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    purpose: &str,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<EmailToken, sqlx::Error> {
    sqlx::query_as::<_, EmailToken>(
        "INSERT INTO email_tokens (user_id, purpose, token_hash, expires_at)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(user_id)
    .bind(purpose)
    .bind(token_hash)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

pub async fn find_by_hash(
    pool: &PgPool,
    purpose: &str,
    token_hash: &str,
) -> Result<Option<EmailToken>, sqlx::Error> {
    sqlx::query_as::<_, EmailToken>(
        "SELECT * FROM email_tokens WHERE purpose = $1 AND token_hash = $2",
    )
    .bind(purpose)
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

pub async fn mark_used(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE email_tokens SET used = true WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Invalidates outstanding tokens before a new one is issued, so only the
/// most recent link can succeed.
pub async fn delete_all_for_user(
    pool: &PgPool,
    user_id: Uuid,
    purpose: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM email_tokens WHERE user_id = $1 AND purpose = $2")
        .bind(user_id)
        .bind(purpose)
        .execute(pool)
        .await?;
    Ok(())
}
