use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::{require_membership, AuthUser};
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Organization, Session, User};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
pub struct SetActiveOrganization {
    pub organization_id: Uuid,
}

pub async fn profile(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let memberships = db::memberships::list_for_user(&state.pool, auth.user.id).await?;

    Ok(Json(serde_json::json!({
        "user": auth.user,
        "memberships": memberships,
        "active_organization_id": auth.session.active_organization_id,
    })))
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateProfile>,
) -> Result<Json<User>, AppError> {
    if let Some(ref name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".to_string()));
        }
    }

    let user = db::users::update_profile(
        &state.pool,
        auth.user.id,
        req.name.as_deref().map(str::trim),
        req.image_url.as_deref(),
    )
    .await?;

    audit::log_event(
        &state.pool,
        None,
        Some(user.id),
        "user.profile_updated",
        "user",
        Some(user.id),
        None,
    )
    .await;

    Ok(Json(user))
}

pub async fn organizations(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Organization>>, AppError> {
    let orgs = db::organizations::list_for_user(&state.pool, auth.user.id).await?;
    Ok(Json(orgs))
}

/// Records which organization the caller is acting in. Membership is checked
/// here; individual handlers still re-derive the role on every request.
pub async fn set_active_organization(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<SetActiveOrganization>,
) -> Result<Json<Session>, AppError> {
    require_membership(&state.pool, auth.user.id, req.organization_id).await?;

    let session =
        db::sessions::set_active_organization(&state.pool, auth.session.id, Some(req.organization_id))
            .await?;

    Ok(Json(session))
}
