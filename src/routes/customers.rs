use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::access::{has_permission, Action, Resource};
use crate::auth::extractor::{require_membership, AuthUser};
use crate::db;
use crate::error::{AppError, FieldError};
use crate::middleware::audit;
use crate::models::Customer;
use crate::routes::auth::{is_valid_email, normalize_email};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub suburb: Option<String>,
    #[serde(default)]
    pub is_commercial: bool,
}

#[derive(Deserialize)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub suburb: Option<String>,
    pub is_commercial: Option<bool>,
}

fn validate_create(req: &CreateCustomer) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if req.name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    }
    if !is_valid_email(&req.email) {
        errors.push(FieldError::new("email", "A valid email address is required"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let org_id = auth.active_organization_id()?;
    let (_, role) = require_membership(&state.pool, auth.user.id, org_id).await?;

    if !has_permission(role, Resource::Customer, &[Action::Read]) {
        return Err(AppError::Forbidden(
            "Not allowed to view customers".to_string(),
        ));
    }

    let customers = db::customers::list_by_organization(&state.pool, org_id).await?;
    Ok(Json(customers))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, AppError> {
    let org_id = auth.active_organization_id()?;
    let (_, role) = require_membership(&state.pool, auth.user.id, org_id).await?;

    if !has_permission(role, Resource::Customer, &[Action::Read]) {
        return Err(AppError::Forbidden(
            "Not allowed to view customers".to_string(),
        ));
    }

    let customer = db::customers::find_in_organization(&state.pool, org_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
    Ok(Json(customer))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateCustomer>,
) -> Result<Json<Customer>, AppError> {
    let org_id = auth.active_organization_id()?;
    let (_, role) = require_membership(&state.pool, auth.user.id, org_id).await?;

    if !has_permission(role, Resource::Customer, &[Action::Create]) {
        return Err(AppError::Forbidden(
            "Not allowed to create customers".to_string(),
        ));
    }

    validate_create(&req)?;
    let email = normalize_email(&req.email);

    let customer = db::customers::create(
        &state.pool,
        org_id,
        auth.user.id,
        req.name.trim(),
        &email,
        req.phone.as_deref(),
        req.address.as_deref(),
        req.suburb.as_deref(),
        req.is_commercial,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(org_id),
        Some(auth.user.id),
        "customer.created",
        "customer",
        Some(customer.id),
        None,
    )
    .await;

    Ok(Json(customer))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCustomer>,
) -> Result<Json<Customer>, AppError> {
    let org_id = auth.active_organization_id()?;
    let (_, role) = require_membership(&state.pool, auth.user.id, org_id).await?;

    if !has_permission(role, Resource::Customer, &[Action::Update]) {
        return Err(AppError::Forbidden(
            "Not allowed to update customers".to_string(),
        ));
    }

    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".to_string()));
        }
    }
    let email = match &req.email {
        Some(raw) => {
            if !is_valid_email(raw) {
                return Err(AppError::BadRequest(
                    "A valid email address is required".to_string(),
                ));
            }
            Some(normalize_email(raw))
        }
        None => None,
    };

    let customer = db::customers::update_in_organization(
        &state.pool,
        org_id,
        id,
        req.name.as_deref().map(str::trim),
        email.as_deref(),
        req.phone.as_deref(),
        req.address.as_deref(),
        req.suburb.as_deref(),
        req.is_commercial,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    audit::log_event(
        &state.pool,
        Some(org_id),
        Some(auth.user.id),
        "customer.updated",
        "customer",
        Some(customer.id),
        None,
    )
    .await;

    Ok(Json(customer))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let org_id = auth.active_organization_id()?;
    let (_, role) = require_membership(&state.pool, auth.user.id, org_id).await?;

    if !has_permission(role, Resource::Customer, &[Action::Delete]) {
        return Err(AppError::Forbidden(
            "Not allowed to delete customers".to_string(),
        ));
    }

    let deleted = db::customers::delete_in_organization(&state.pool, org_id, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Customer not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(org_id),
        Some(auth.user.id),
        "customer.deleted",
        "customer",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
