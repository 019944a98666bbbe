use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::access::{has_permission, Action, Resource, Role};
use crate::auth::extractor::{resolve_org_role, AuthUser};
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{MemberDetail, Membership};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct UpdateMemberRole {
    pub role: String,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((org_id, claimed_role)): Path<(Uuid, String)>,
) -> Result<Json<Vec<MemberDetail>>, AppError> {
    let (_, role) = resolve_org_role(&state.pool, auth.user.id, org_id, &claimed_role).await?;

    if !has_permission(role, Resource::Member, &[Action::Create]) {
        return Err(AppError::Forbidden(
            "Not allowed to manage members".to_string(),
        ));
    }

    let members = db::memberships::list_members(&state.pool, org_id).await?;
    Ok(Json(members))
}

pub async fn update_role(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((org_id, claimed_role, user_id)): Path<(Uuid, String, Uuid)>,
    Json(req): Json<UpdateMemberRole>,
) -> Result<Json<Membership>, AppError> {
    let (_, role) = resolve_org_role(&state.pool, auth.user.id, org_id, &claimed_role).await?;

    if !has_permission(role, Resource::Member, &[Action::Update]) {
        return Err(AppError::Forbidden(
            "Not allowed to change member roles".to_string(),
        ));
    }

    let new_role: Role = req.role.parse().map_err(|_| {
        AppError::BadRequest("Invalid role: must be owner, admin or member".to_string())
    })?;

    // Only an owner may mint another owner
    if new_role == Role::Owner && role != Role::Owner {
        return Err(AppError::Forbidden(
            "Only an owner can assign the owner role".to_string(),
        ));
    }

    let target = db::memberships::find(&state.pool, user_id, org_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

    if target.role == Role::Owner.as_str()
        && new_role != Role::Owner
        && db::memberships::count_owners(&state.pool, org_id).await? <= 1
    {
        return Err(AppError::Conflict(
            "Cannot demote the last owner of an organization".to_string(),
        ));
    }

    let membership = db::memberships::update_role(&state.pool, user_id, org_id, new_role.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(org_id),
        Some(auth.user.id),
        "member.role_updated",
        "membership",
        Some(membership.id),
        Some(serde_json::json!({ "user_id": user_id, "role": new_role.as_str() })),
    )
    .await;

    Ok(Json(membership))
}

pub async fn remove(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((org_id, claimed_role, user_id)): Path<(Uuid, String, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (_, role) = resolve_org_role(&state.pool, auth.user.id, org_id, &claimed_role).await?;

    if !has_permission(role, Resource::Member, &[Action::Delete]) {
        return Err(AppError::Forbidden(
            "Not allowed to remove members".to_string(),
        ));
    }

    let target = db::memberships::find(&state.pool, user_id, org_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

    // An organization must never end up without an owner
    if target.role == Role::Owner.as_str()
        && db::memberships::count_owners(&state.pool, org_id).await? <= 1
    {
        return Err(AppError::Conflict(
            "Cannot remove the last owner of an organization".to_string(),
        ));
    }

    db::memberships::delete(&state.pool, user_id, org_id).await?;

    audit::log_event(
        &state.pool,
        Some(org_id),
        Some(auth.user.id),
        "member.removed",
        "membership",
        Some(target.id),
        Some(serde_json::json!({ "user_id": user_id })),
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Removed" })))
}
