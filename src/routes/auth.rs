use std::net::{IpAddr, SocketAddr};
use std::sync::LazyLock;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::{AuthUser, SESSION_COOKIE};
use crate::auth::{password, tokens};
use crate::db;
use crate::error::{AppError, FieldError};
use crate::middleware::audit;
use crate::models::email_token::{PURPOSE_RESET_PASSWORD, PURPOSE_VERIFY_EMAIL};
use crate::models::User;
use crate::state::SharedState;

const VERIFY_TOKEN_TTL_HOURS: i64 = 24;
const RESET_TOKEN_TTL_HOURS: i64 = 1;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Emails are stored and compared lower-cased, so sign-in and invitation
/// matching are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

fn session_cookie(token: &str, ttl_hours: i64) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(ttl_hours))
        .build();

    CookieJar::new().add(cookie)
}

fn clear_session_cookie() -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(cookie)
}

async fn create_session(
    state: &SharedState,
    user_id: Uuid,
    headers: &HeaderMap,
    peer_addr: Option<IpAddr>,
) -> Result<String, AppError> {
    let token = tokens::generate();
    let token_hash = tokens::hash(&token);
    let ip = tokens::client_ip(headers, peer_addr, &state.config.trusted_proxies);
    let user_agent = tokens::user_agent(headers);

    db::sessions::create(
        &state.pool,
        user_id,
        &token_hash,
        Some(&ip),
        user_agent.as_deref(),
        Utc::now() + Duration::hours(state.config.session_ttl_hours),
    )
    .await?;

    Ok(token)
}

/// Issues a fresh verification token and emails it on a spawned task. The
/// request that triggered this never waits on SMTP.
fn dispatch_verification_email(state: &SharedState, user_id: Uuid, email: String) {
    let pool = state.pool.clone();
    let mailer = state.system_mailer.clone();
    let base_url = state.config.base_url.clone();

    tokio::spawn(async move {
        let token = tokens::generate();
        let token_hash = tokens::hash(&token);

        let _ = db::email_tokens::delete_all_for_user(&pool, user_id, PURPOSE_VERIFY_EMAIL).await;

        if let Ok(_) = db::email_tokens::create(
            &pool,
            user_id,
            PURPOSE_VERIFY_EMAIL,
            &token_hash,
            Utc::now() + Duration::hours(VERIFY_TOKEN_TTL_HOURS),
        )
        .await
        {
            if let Some(mailer) = mailer {
                let verify_url = format!("{base_url}/auth/verify-email?token={token}");
                if let Err(e) = mailer.send_verification(&email, &verify_url).await {
                    tracing::error!("Failed to send verification email: {e}");
                }
            } else {
                tracing::warn!("System SMTP not configured. Verification token: {token}");
            }
        }
    });
}

fn validate_signup(req: &SignupRequest) -> Result<(), AppError> {
    let mut fields = Vec::new();

    if req.name.trim().is_empty() {
        fields.push(FieldError::new("name", "Name is required"));
    }
    if !EMAIL_RE.is_match(req.email.trim()) {
        fields.push(FieldError::new("email", "A valid email is required"));
    }
    if let Err(msg) = password::check_strength(&req.password) {
        fields.push(FieldError::new("password", &msg));
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(fields))
    }
}

pub async fn signup(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<SignupRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    validate_signup(&req)?;

    let email = normalize_email(&req.email);
    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Advisory lock so exactly one concurrent first registration wins the
    // superadmin flag.
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await?;

    let count = db::users::count_all(&mut *tx).await?;
    let is_superadmin = count == 0;

    let user = db::users::create(&mut *tx, req.name.trim(), &email, &pw_hash, is_superadmin)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("A user with this email already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

    tx.commit().await?;

    let token = create_session(&state, user.id, &headers, Some(addr.ip())).await?;

    audit::log_event(
        &state.pool,
        None,
        Some(user.id),
        "user.signed_up",
        "user",
        Some(user.id),
        None,
    )
    .await;

    dispatch_verification_email(&state, user.id, user.email.clone());

    let jar = session_cookie(&token, state.config.session_ttl_hours);
    Ok((jar, Json(SessionResponse { token, user })))
}

pub async fn signin(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<SigninRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    let email = normalize_email(&req.email);

    if state.login_limiter.check(&email).is_err() {
        return Err(AppError::RateLimited(
            "Too many sign-in attempts. Please try again later.".to_string(),
        ));
    }

    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;

    if !valid {
        state.login_limiter.record_failure(&email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    if user.banned {
        return Err(AppError::Forbidden("Account is banned".to_string()));
    }

    if state.config.require_email_verification && !user.email_verified {
        return Err(AppError::Forbidden(
            "Email not verified. Check your inbox for the verification link.".to_string(),
        ));
    }

    let token = create_session(&state, user.id, &headers, Some(addr.ip())).await?;

    audit::log_event(
        &state.pool,
        None,
        Some(user.id),
        "user.signed_in",
        "user",
        Some(user.id),
        None,
    )
    .await;

    let jar = session_cookie(&token, state.config.session_ttl_hours);
    Ok((jar, Json(SessionResponse { token, user })))
}

pub async fn signout(
    State(state): State<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()));

    if let Some(token) = token {
        let token_hash = tokens::hash(&token);
        db::sessions::delete_by_hash(&state.pool, &token_hash).await?;
    }

    Ok((
        clear_session_cookie(),
        Json(MessageResponse {
            message: "Signed out successfully".to_string(),
        }),
    ))
}

pub async fn verify_email(
    State(state): State<SharedState>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let token_hash = tokens::hash(&req.token);

    let token = db::email_tokens::find_by_hash(&state.pool, PURPOSE_VERIFY_EMAIL, &token_hash)
        .await?
        .filter(|t| !t.used && t.expires_at > Utc::now())
        .ok_or_else(|| {
            AppError::BadRequest("Invalid or expired verification token".to_string())
        })?;

    db::email_tokens::mark_used(&state.pool, token.id).await?;
    db::users::mark_email_verified(&state.pool, token.user_id).await?;

    audit::log_event(
        &state.pool,
        None,
        Some(token.user_id),
        "user.email_verified",
        "user",
        Some(token.user_id),
        None,
    )
    .await;

    Ok(Json(MessageResponse {
        message: "Email verified successfully".to_string(),
    }))
}

pub async fn resend_verification(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    if auth.user.email_verified {
        return Ok(Json(MessageResponse {
            message: "Email is already verified".to_string(),
        }));
    }

    dispatch_verification_email(&state, auth.user.id, auth.user.email.clone());

    Ok(Json(MessageResponse {
        message: "Verification email sent".to_string(),
    }))
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    // Always return 200 to not reveal whether the email exists
    let response = Json(MessageResponse {
        message: "If that email is registered, a reset link has been sent.".to_string(),
    });

    let email = normalize_email(&req.email);
    let pool = state.pool.clone();
    let mailer = state.system_mailer.clone();
    let base_url = state.config.base_url.clone();

    tokio::spawn(async move {
        if let Ok(Some(user)) = db::users::find_by_email(&pool, &email).await {
            let token = tokens::generate();
            let token_hash = tokens::hash(&token);

            let _ =
                db::email_tokens::delete_all_for_user(&pool, user.id, PURPOSE_RESET_PASSWORD).await;

            if let Ok(_) = db::email_tokens::create(
                &pool,
                user.id,
                PURPOSE_RESET_PASSWORD,
                &token_hash,
                Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS),
            )
            .await
            {
                if let Some(mailer) = mailer {
                    let reset_url = format!("{base_url}/auth/reset-password?token={token}");
                    if let Err(e) = mailer.send_password_reset(&user.email, &reset_url).await {
                        tracing::error!("Failed to send password reset email: {e}");
                    }
                } else {
                    tracing::warn!("System SMTP not configured. Password reset token: {token}");
                }
            }
        }
    });

    Ok(response)
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    password::check_strength(&req.password).map_err(AppError::BadRequest)?;

    let token_hash = tokens::hash(&req.token);

    let reset_token = db::email_tokens::find_by_hash(&state.pool, PURPOSE_RESET_PASSWORD, &token_hash)
        .await?
        .filter(|t| !t.used && t.expires_at > Utc::now())
        .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

    db::email_tokens::mark_used(&state.pool, reset_token.id).await?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, reset_token.user_id, &pw_hash).await?;

    // Every live session dies with the old password
    db::sessions::delete_all_for_user(&state.pool, reset_token.user_id).await?;

    audit::log_event(
        &state.pool,
        None,
        Some(reset_token.user_id),
        "user.password_reset",
        "user",
        Some(reset_token.user_id),
        None,
    )
    .await;

    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    }))
}

pub async fn change_password(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    auth: AuthUser,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    password::check_strength(&req.new_password).map_err(AppError::BadRequest)?;

    let valid = password::verify(&req.current_password, &auth.user.password_hash)
        .map_err(AppError::Internal)?;

    if !valid {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, auth.user.id, &pw_hash).await?;

    // Revoke everything, then hand the caller a fresh session
    db::sessions::delete_all_for_user(&state.pool, auth.user.id).await?;
    let token = create_session(&state, auth.user.id, &headers, Some(addr.ip())).await?;

    audit::log_event(
        &state.pool,
        None,
        Some(auth.user.id),
        "user.password_changed",
        "user",
        Some(auth.user.id),
        None,
    )
    .await;

    let jar = session_cookie(&token, state.config.session_ttl_hours);
    Ok((
        jar,
        Json(SessionResponse {
            token,
            user: auth.user,
        }),
    ))
}
