use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::access::Role;
use crate::auth::tokens;
use crate::db;
use crate::error::AppError;
use crate::models::{Membership, Session, User};
use crate::state::SharedState;

pub const SESSION_COOKIE: &str = "session_token";

/// The resolved request identity: the session row the token mapped to plus
/// the user behind it. Bans and expiry are enforced here, so a banned user's
/// live sessions die on their next request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub session: Session,
}

impl AuthUser {
    pub fn require_superadmin(&self) -> Result<(), AppError> {
        if self.user.is_superadmin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Superadmin access required".to_string(),
            ))
        }
    }

    pub fn active_organization_id(&self) -> Result<Uuid, AppError> {
        self.session.active_organization_id.ok_or_else(|| {
            AppError::BadRequest("No active organization selected".to_string())
        })
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing session token".to_string()))?;

        let token_hash = tokens::hash(&token);
        let session = db::sessions::find_by_hash(&state.pool, &token_hash)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid session".to_string()))?;

        if session.expires_at < Utc::now() {
            return Err(AppError::Unauthorized("Session expired".to_string()));
        }

        let user = db::users::find_by_id(&state.pool, session.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid session".to_string()))?;

        if user.banned {
            return Err(AppError::Forbidden("Account is banned".to_string()));
        }

        Ok(AuthUser { user, session })
    }
}

fn extract_token(parts: &Parts) -> Option<String> {
    // Bearer token from the Authorization header first
    if let Some(auth_header) = parts.headers.get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Loads the caller's membership in an organization. No membership row means
/// the caller has no standing at all, whatever role the URL claimed.
pub async fn require_membership(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Uuid,
) -> Result<(Membership, Role), AppError> {
    let membership = db::memberships::find(pool, user_id, organization_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Not a member of this organization".to_string()))?;

    let role: Role = membership
        .role
        .parse()
        .map_err(|_| AppError::Forbidden("Membership role not recognized".to_string()))?;

    Ok((membership, role))
}

/// Role segments in request paths are advisory. The stored membership is the
/// truth; a claim that disagrees with it is rejected, never downgraded.
pub async fn resolve_org_role(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Uuid,
    claimed_role: &str,
) -> Result<(Membership, Role), AppError> {
    let (membership, role) = require_membership(pool, user_id, organization_id).await?;

    if membership.role != claimed_role {
        return Err(AppError::Forbidden(
            "Claimed role does not match membership".to_string(),
        ));
    }

    Ok((membership, role))
}
