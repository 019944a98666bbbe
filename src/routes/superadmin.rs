use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use bytes::Bytes;
use chrono::{Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::access::Role;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{ImageFile, Invitation, Organization, User};
use crate::routes::auth::{is_valid_email, normalize_email};
use crate::routes::images::process_logo_upload;
use crate::routes::invitations::dispatch_invitation_email;
use crate::routes::organizations::{slugify, validate_slug, CreateOrganization, UpdateOrganization};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct InviteOwner {
    pub organization_id: Uuid,
    pub email: String,
}

#[derive(Deserialize)]
pub struct AuditLogParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list_organizations(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Organization>>, AppError> {
    auth.require_superadmin()?;
    let organizations = db::organizations::list_all(&state.pool).await?;
    Ok(Json(organizations))
}

/// Provision an organization without joining it. Ownership is handed over
/// through an owner invitation instead.
pub async fn create_organization(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateOrganization>,
) -> Result<Json<Organization>, AppError> {
    auth.require_superadmin()?;

    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    let slug = req.slug.unwrap_or_else(|| slugify(&req.name));
    validate_slug(&slug)?;

    let org = db::organizations::create(
        &state.pool,
        req.id,
        req.name.trim(),
        &slug,
        req.abn.as_deref(),
        req.phone.as_deref(),
        req.business_address.as_deref(),
        req.trade_currency.as_deref(),
        req.email.as_deref(),
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("An organization with this slug already exists".to_string())
        }
        _ => AppError::Database(e),
    })?;

    audit::log_event(
        &state.pool,
        Some(org.id),
        Some(auth.user.id),
        "organization.created",
        "organization",
        Some(org.id),
        None,
    )
    .await;

    Ok(Json(org))
}

pub async fn invite_owner(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<InviteOwner>,
) -> Result<Json<Invitation>, AppError> {
    auth.require_superadmin()?;

    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest(
            "A valid email address is required".to_string(),
        ));
    }

    let org = db::organizations::find_by_id(&state.pool, req.organization_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    if let Some(user) = db::users::find_by_email(&state.pool, &email).await? {
        if db::memberships::find(&state.pool, user.id, org.id).await?.is_some() {
            return Err(AppError::Conflict(
                "User is already a member of this organization".to_string(),
            ));
        }
    }

    if db::invitations::find_pending(&state.pool, org.id, &email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A pending invitation for this email already exists".to_string(),
        ));
    }

    let expires_at = Utc::now() + Duration::hours(state.config.invitation_ttl_hours);
    let invitation = db::invitations::create(
        &state.pool,
        org.id,
        auth.user.id,
        &email,
        Role::Owner.as_str(),
        expires_at,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(org.id),
        Some(auth.user.id),
        "invitation.created",
        "invitation",
        Some(invitation.id),
        Some(serde_json::json!({ "email": email, "role": Role::Owner.as_str() })),
    )
    .await;

    dispatch_invitation_email(&state, &invitation, org.name, auth.user.name.clone());

    Ok(Json(invitation))
}

pub async fn organization_detail(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_superadmin()?;

    let organization = db::organizations::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let members = db::memberships::list_all_members(&state.pool, id).await?;
    let images = db::image_files::list_by_organization(&state.pool, id).await?;

    Ok(Json(serde_json::json!({
        "organization": organization,
        "members": members,
        "images": images,
    })))
}

pub async fn update_organization(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrganization>,
) -> Result<Json<Organization>, AppError> {
    auth.require_superadmin()?;

    if let Some(slug) = &req.slug {
        validate_slug(slug)?;
    }
    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".to_string()));
        }
    }

    let org = db::organizations::update(
        &state.pool,
        id,
        req.name.as_deref().map(str::trim),
        req.slug.as_deref(),
        req.abn.as_deref(),
        req.phone.as_deref(),
        req.business_address.as_deref(),
        req.trade_currency.as_deref(),
        req.email.as_deref(),
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Organization not found".to_string()),
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("An organization with this slug already exists".to_string())
        }
        _ => AppError::Database(e),
    })?;

    audit::log_event(
        &state.pool,
        Some(org.id),
        Some(auth.user.id),
        "organization.updated",
        "organization",
        Some(org.id),
        None,
    )
    .await;

    Ok(Json(org))
}

pub async fn upload_logo(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImageFile>, AppError> {
    auth.require_superadmin()?;
    let image = process_logo_upload(&state, id, auth.user.id, &headers, body).await?;
    Ok(Json(image))
}

pub async fn audit_log(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(params): Query<AuditLogParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_superadmin()?;

    db::organizations::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(50).min(200).max(1);
    let offset = (page - 1) * per_page;

    let events = db::audit::list(&state.pool, id, per_page, offset).await?;
    let total = db::audit::count(&state.pool, id).await?;

    Ok(Json(serde_json::json!({
        "events": events,
        "total": total,
        "page": page,
        "per_page": per_page,
    })))
}

pub async fn list_users(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    auth.require_superadmin()?;
    let users = db::users::list_all(&state.pool).await?;
    Ok(Json(users))
}

pub async fn ban_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_superadmin()?;

    if id == auth.user.id {
        return Err(AppError::BadRequest("You cannot ban yourself".to_string()));
    }

    db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    db::users::set_banned(&state.pool, id, true).await?;
    // Cut off anything the user still has open
    db::sessions::delete_all_for_user(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        None,
        Some(auth.user.id),
        "user.banned",
        "user",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "User banned" })))
}

pub async fn unban_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_superadmin()?;

    db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    db::users::set_banned(&state.pool, id, false).await?;

    audit::log_event(
        &state.pool,
        None,
        Some(auth.user.id),
        "user.unbanned",
        "user",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "User unbanned" })))
}
