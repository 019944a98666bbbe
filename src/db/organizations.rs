use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Organization;

/// Inserts an organization. When the caller supplies an id (retry with an
/// idempotency key) an existing row with that id is left untouched and
/// returned as-is instead of erroring.
pub async fn create(
    pool: &PgPool,
    id: Option<Uuid>,
    name: &str,
    slug: &str,
    abn: Option<&str>,
    phone: Option<&str>,
    business_address: Option<&str>,
    trade_currency: Option<&str>,
    email: Option<&str>,
) -> Result<Organization, sqlx::Error> {
    let id = id.unwrap_or_else(Uuid::now_v7);
    let inserted = sqlx::query_as::<_, Organization>(
        "INSERT INTO organizations (id, name, slug, abn, phone, business_address, trade_currency, email)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (id) DO NOTHING
         RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(slug)
    .bind(abn)
    .bind(phone)
    .bind(business_address)
    .bind(trade_currency)
    .bind(email)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(org) => Ok(org),
        None => {
            sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
                .bind(id)
                .fetch_one(pool)
                .await
        }
    }
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>("SELECT * FROM organizations ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Organization>, sqlx::Error> {
    sqlx::query_as::<_, Organization>(
        "SELECT o.* FROM organizations o
         JOIN memberships m ON m.organization_id = o.id
         WHERE m.user_id = $1
         ORDER BY o.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    slug: Option<&str>,
    abn: Option<&str>,
    phone: Option<&str>,
    business_address: Option<&str>,
    trade_currency: Option<&str>,
    email: Option<&str>,
) -> Result<Organization, sqlx::Error> {
    sqlx::query_as::<_, Organization>(
        "UPDATE organizations SET
            name = COALESCE($2, name),
            slug = COALESCE($3, slug),
            abn = COALESCE($4, abn),
            phone = COALESCE($5, phone),
            business_address = COALESCE($6, business_address),
            trade_currency = COALESCE($7, trade_currency),
            email = COALESCE($8, email),
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(slug)
    .bind(abn)
    .bind(phone)
    .bind(business_address)
    .bind(trade_currency)
    .bind(email)
    .fetch_one(pool)
    .await
}

pub async fn set_logo_url(pool: &PgPool, id: Uuid, logo_url: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE organizations SET logo_url = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(logo_url)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM organizations WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
