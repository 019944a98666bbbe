use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Customer;

#[allow(clippy::too_many_arguments)]
pub async fn create(
    pool: &PgPool,
    organization_id: Uuid,
    added_by_user_id: Uuid,
    name: &str,
    email: &str,
    phone: Option<&str>,
    address: Option<&str>,
    suburb: Option<&str>,
    is_commercial: bool,
) -> Result<Customer, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (organization_id, added_by_user_id, name, email, phone, address, suburb, is_commercial)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(organization_id)
    .bind(added_by_user_id)
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(address)
    .bind(suburb)
    .bind(is_commercial)
    .fetch_one(pool)
    .await
}

/// Lookups are always scoped to the organization so one tenant can never
/// address another tenant's customer by id.
pub async fn find_in_organization(
    pool: &PgPool,
    organization_id: Uuid,
    id: Uuid,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE id = $1 AND organization_id = $2",
    )
    .bind(id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_by_organization(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE organization_id = $1 ORDER BY created_at DESC",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update_in_organization(
    pool: &PgPool,
    organization_id: Uuid,
    id: Uuid,
    name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    address: Option<&str>,
    suburb: Option<&str>,
    is_commercial: Option<bool>,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "UPDATE customers SET
            name = COALESCE($3, name),
            email = COALESCE($4, email),
            phone = COALESCE($5, phone),
            address = COALESCE($6, address),
            suburb = COALESCE($7, suburb),
            is_commercial = COALESCE($8, is_commercial),
            updated_at = now()
         WHERE id = $1 AND organization_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(organization_id)
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(address)
    .bind(suburb)
    .bind(is_commercial)
    .fetch_optional(pool)
    .await
}

pub async fn delete_in_organization(
    pool: &PgPool,
    organization_id: Uuid,
    id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(organization_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
