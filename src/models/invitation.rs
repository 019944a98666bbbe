use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ACCEPTED: &str = "accepted";
pub const STATUS_REJECTED: &str = "rejected";
pub const STATUS_CANCELED: &str = "canceled";

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub inviter_id: Uuid,
    pub email: String,
    pub role: String,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Invitation joined with organization and inviter names, for the
/// invitee-facing listing.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct InvitationDetail {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub organization_name: String,
    pub inviter_name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
