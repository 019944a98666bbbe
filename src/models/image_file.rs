use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ImageFile {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub uploaded_by_user_id: Uuid,
    pub file_name: String,
    pub cdn_id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}
