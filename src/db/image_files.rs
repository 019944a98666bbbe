use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ImageFile;

pub async fn create(
    pool: &PgPool,
    organization_id: Uuid,
    uploaded_by_user_id: Uuid,
    file_name: &str,
    cdn_id: &str,
    url: &str,
) -> Result<ImageFile, sqlx::Error> {
    sqlx::query_as::<_, ImageFile>(
        "INSERT INTO image_files (organization_id, uploaded_by_user_id, file_name, cdn_id, url)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(organization_id)
    .bind(uploaded_by_user_id)
    .bind(file_name)
    .bind(cdn_id)
    .bind(url)
    .fetch_one(pool)
    .await
}

pub async fn list_by_organization(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<ImageFile>, sqlx::Error> {
    sqlx::query_as::<_, ImageFile>(
        "SELECT * FROM image_files WHERE organization_id = $1 ORDER BY created_at DESC",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .await
}
