use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use bytes::Bytes;
use uuid::Uuid;

use crate::access::{has_permission, Action, Resource};
use crate::auth::extractor::{resolve_org_role, AuthUser};
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::ImageFile;
use crate::state::SharedState;

/// Pull the "file" part out of a multipart body.
async fn read_file_field(
    headers: &HeaderMap,
    body: Bytes,
) -> Result<(String, String, Bytes), AppError> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| {
            AppError::BadRequest("Expected a multipart/form-data request".to_string())
        })?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file field: {e}")))?;
        return Ok((file_name, content_type, data));
    }

    Err(AppError::BadRequest(
        "Missing \"file\" field in multipart body".to_string(),
    ))
}

/// Upload a logo to the image CDN, record it and point the organization at
/// the new URL. Shared by the member-facing and superadmin routes.
pub(crate) async fn process_logo_upload(
    state: &SharedState,
    org_id: Uuid,
    user_id: Uuid,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<ImageFile, AppError> {
    let uploader = state
        .image_uploader
        .as_ref()
        .ok_or_else(|| AppError::Upstream("Image uploads are not configured".to_string()))?;

    if db::organizations::find_by_id(&state.pool, org_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Organization not found".to_string()));
    }

    let (file_name, content_type, data) = read_file_field(headers, body).await?;
    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequest(
            "Only image uploads are accepted".to_string(),
        ));
    }
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }

    let uploaded = uploader
        .upload(&file_name, &content_type, data)
        .await
        .map_err(AppError::Upstream)?;

    let image = db::image_files::create(
        &state.pool,
        org_id,
        user_id,
        &file_name,
        &uploaded.id,
        &uploaded.url,
    )
    .await?;
    db::organizations::set_logo_url(&state.pool, org_id, &uploaded.url).await?;

    audit::log_event(
        &state.pool,
        Some(org_id),
        Some(user_id),
        "organization.logo_updated",
        "organization",
        Some(org_id),
        Some(serde_json::json!({ "image_id": image.id })),
    )
    .await;

    Ok(image)
}

pub async fn upload_logo(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path((org_id, claimed_role)): Path<(Uuid, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImageFile>, AppError> {
    let (_, role) = resolve_org_role(&state.pool, auth.user.id, org_id, &claimed_role).await?;

    if !has_permission(role, Resource::Organization, &[Action::Update]) {
        return Err(AppError::Forbidden(
            "Not allowed to update this organization".to_string(),
        ));
    }

    let image = process_logo_upload(&state, org_id, auth.user.id, &headers, body).await?;
    Ok(Json(image))
}
