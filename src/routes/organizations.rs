use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::access::{has_permission, Action, Resource, Role};
use crate::auth::extractor::{resolve_org_role, AuthUser};
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::Organization;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateOrganization {
    /// Client-generated id doubles as an idempotency key: a retried create
    /// with the same id returns the existing organization.
    pub id: Option<Uuid>,
    pub name: String,
    pub slug: Option<String>,
    pub abn: Option<String>,
    pub phone: Option<String>,
    pub business_address: Option<String>,
    pub trade_currency: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub abn: Option<String>,
    pub phone: Option<String>,
    pub business_address: Option<String>,
    pub trade_currency: Option<String>,
    pub email: Option<String>,
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateOrganization>,
) -> Result<Json<Organization>, AppError> {
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

    // Creator becomes owner. The store gives us no cross-table transaction
    // here, so a failed membership insert removes the parent row again
    // rather than leaving an ownerless organization behind.
    match db::memberships::create(&state.pool, auth.user.id, org.id, Role::Owner.as_str()).await {
        Ok(_) => {}
        Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
            // Retried create: the owner membership is already in place
        }
        Err(e) => {
            if let Err(cleanup) = db::organizations::delete(&state.pool, org.id).await {
                tracing::error!(
                    "Failed to remove organization {} after membership insert failed: {cleanup}",
                    org.id
                );
            }
            return Err(AppError::Database(e));
        }
    }

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

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((org_id, claimed_role)): Path<(Uuid, String)>,
    Json(req): Json<UpdateOrganization>,
) -> Result<Json<Organization>, AppError> {
    let (_, role) = resolve_org_role(&state.pool, auth.user.id, org_id, &claimed_role).await?;

    if !has_permission(role, Resource::Organization, &[Action::Update]) {
        return Err(AppError::Forbidden(
            "Not allowed to update this organization".to_string(),
        ));
    }

    if let Some(ref slug) = req.slug {
        validate_slug(slug)?;
    }
    if let Some(ref name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".to_string()));
        }
    }

    let org = db::organizations::update(
        &state.pool,
        org_id,
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

pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > 100 {
        return Err(AppError::BadRequest(
            "Slug must be between 1 and 100 characters".to_string(),
        ));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::BadRequest(
            "Slug must contain only lowercase letters, numbers, and hyphens".to_string(),
        ));
    }
    Ok(())
}
