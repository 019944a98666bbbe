use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::access::{has_permission, Action, Resource, Role};
use crate::auth::extractor::{resolve_org_role, AuthUser};
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::invitation::{
    STATUS_ACCEPTED, STATUS_CANCELED, STATUS_PENDING, STATUS_REJECTED,
};
use crate::models::{Invitation, InvitationDetail, Membership};
use crate::routes::auth::{is_valid_email, normalize_email};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateInvitation {
    pub email: String,
    pub role: String,
}

/// Writes the invitation row, then emails the invitee on a spawned task.
/// The row is the source of truth; a failed email is logged, never surfaced.
pub(crate) fn dispatch_invitation_email(
    state: &SharedState,
    invitation: &Invitation,
    organization_name: String,
    inviter_name: String,
) {
    let mailer = state.system_mailer.clone();
    let base_url = state.config.base_url.clone();
    let expires_hours = state.config.invitation_ttl_hours;
    let to_email = invitation.email.clone();
    let owner_invite = invitation.role == Role::Owner.as_str();

    tokio::spawn(async move {
        let Some(mailer) = mailer else {
            tracing::warn!("System SMTP not configured. Invitation for {to_email} not emailed.");
            return;
        };

        let accept_url = format!("{base_url}/invitations/pending");
        let result = if owner_invite {
            mailer
                .send_owner_invitation(&to_email, &organization_name, &accept_url, expires_hours)
                .await
        } else {
            mailer
                .send_invitation(
                    &to_email,
                    &organization_name,
                    &inviter_name,
                    &accept_url,
                    expires_hours,
                )
                .await
        };

        if let Err(e) = result {
            tracing::error!("Failed to send invitation email: {e}");
        }
    });
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((org_id, claimed_role)): Path<(Uuid, String)>,
    Json(req): Json<CreateInvitation>,
) -> Result<Json<Invitation>, AppError> {
    let (_, role) = resolve_org_role(&state.pool, auth.user.id, org_id, &claimed_role).await?;

    if !has_permission(role, Resource::Invitation, &[Action::Create]) {
        return Err(AppError::Forbidden(
            "Not allowed to invite members".to_string(),
        ));
    }

    let invited_role: Role = req.role.parse().map_err(|_| {
        AppError::BadRequest("Invalid role: must be owner, admin or member".to_string())
    })?;

    if invited_role == Role::Owner && role != Role::Owner {
        return Err(AppError::Forbidden(
            "Only an owner can invite another owner".to_string(),
        ));
    }

    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest(
            "A valid email address is required".to_string(),
        ));
    }

    // Inviting someone who already belongs to the organization is a no-op
    // the caller should hear about
    if let Some(user) = db::users::find_by_email(&state.pool, &email).await? {
        if db::memberships::find(&state.pool, user.id, org_id).await?.is_some() {
            return Err(AppError::Conflict(
                "User is already a member of this organization".to_string(),
            ));
        }
    }

    if db::invitations::find_pending(&state.pool, org_id, &email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A pending invitation for this email already exists".to_string(),
        ));
    }

    let org = db::organizations::find_by_id(&state.pool, org_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let invitation = db::invitations::create(
        &state.pool,
        org_id,
        auth.user.id,
        &email,
        invited_role.as_str(),
        Utc::now() + Duration::hours(state.config.invitation_ttl_hours),
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(org_id),
        Some(auth.user.id),
        "invitation.created",
        "invitation",
        Some(invitation.id),
        Some(serde_json::json!({ "email": email, "role": invited_role.as_str() })),
    )
    .await;

    dispatch_invitation_email(&state, &invitation, org.name, auth.user.name.clone());

    Ok(Json(invitation))
}

pub async fn list_for_org(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((org_id, claimed_role)): Path<(Uuid, String)>,
) -> Result<Json<Vec<Invitation>>, AppError> {
    let (_, role) = resolve_org_role(&state.pool, auth.user.id, org_id, &claimed_role).await?;

    if !has_permission(role, Resource::Invitation, &[Action::Create]) {
        return Err(AppError::Forbidden(
            "Not allowed to view invitations".to_string(),
        ));
    }

    let invitations = db::invitations::list_pending_for_organization(&state.pool, org_id).await?;
    Ok(Json(invitations))
}

pub async fn cancel(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((org_id, claimed_role, id)): Path<(Uuid, String, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (_, role) = resolve_org_role(&state.pool, auth.user.id, org_id, &claimed_role).await?;

    if !has_permission(role, Resource::Invitation, &[Action::Cancel]) {
        return Err(AppError::Forbidden(
            "Not allowed to cancel invitations".to_string(),
        ));
    }

    let invitation = db::invitations::find_by_id(&state.pool, id)
        .await?
        .filter(|i| i.organization_id == org_id)
        .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

    db::invitations::mark_status(&state.pool, invitation.id, STATUS_CANCELED)
        .await?
        .ok_or_else(|| AppError::Conflict("Invitation is no longer pending".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(org_id),
        Some(auth.user.id),
        "invitation.canceled",
        "invitation",
        Some(invitation.id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Canceled" })))
}

/// Non-expired pending invitations addressed to the caller, joined with the
/// organization and inviter identity. Drives onboarding after sign-up.
pub async fn pending(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<InvitationDetail>>, AppError> {
    let invitations =
        db::invitations::list_pending_for_email(&state.pool, &auth.user.email).await?;
    Ok(Json(invitations))
}

pub async fn accept(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Membership>, AppError> {
    let invitation = db::invitations::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

    if invitation.email != auth.user.email {
        return Err(AppError::Forbidden(
            "This invitation was issued to a different email".to_string(),
        ));
    }

    if invitation.status != STATUS_PENDING {
        return Err(AppError::Conflict(
            "Invitation is no longer pending".to_string(),
        ));
    }

    if invitation.expires_at < Utc::now() {
        return Err(AppError::Conflict("Invitation has expired".to_string()));
    }

    // Membership first, then the status flip gated on 'pending'. If a
    // concurrent accept or cancel got there first the flip affects zero
    // rows and the membership is rolled back by hand.
    let membership = db::memberships::create(
        &state.pool,
        auth.user.id,
        invitation.organization_id,
        &invitation.role,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Already a member of this organization".to_string())
        }
        _ => AppError::Database(e),
    })?;

    if db::invitations::mark_status(&state.pool, invitation.id, STATUS_ACCEPTED)
        .await?
        .is_none()
    {
        if let Err(cleanup) = db::memberships::delete(
            &state.pool,
            auth.user.id,
            invitation.organization_id,
        )
        .await
        {
            tracing::error!(
                "Failed to remove membership after losing invitation race: {cleanup}"
            );
        }
        return Err(AppError::Conflict(
            "Invitation is no longer pending".to_string(),
        ));
    }

    audit::log_event(
        &state.pool,
        Some(invitation.organization_id),
        Some(auth.user.id),
        "invitation.accepted",
        "invitation",
        Some(invitation.id),
        Some(serde_json::json!({ "role": invitation.role })),
    )
    .await;

    Ok(Json(membership))
}

pub async fn reject(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let invitation = db::invitations::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

    if invitation.email != auth.user.email {
        return Err(AppError::Forbidden(
            "This invitation was issued to a different email".to_string(),
        ));
    }

    if invitation.status != STATUS_PENDING {
        return Err(AppError::Conflict(
            "Invitation is no longer pending".to_string(),
        ));
    }

    if invitation.expires_at < Utc::now() {
        return Err(AppError::Conflict("Invitation has expired".to_string()));
    }

    db::invitations::mark_status(&state.pool, invitation.id, STATUS_REJECTED)
        .await?
        .ok_or_else(|| AppError::Conflict("Invitation is no longer pending".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(invitation.organization_id),
        Some(auth.user.id),
        "invitation.rejected",
        "invitation",
        Some(invitation.id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Rejected" })))
}
