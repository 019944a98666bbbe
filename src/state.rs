use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::email::SystemMailer;
use crate::rate_limit::LoginRateLimiter;
use crate::upload::ImageUploader;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub system_mailer: Option<Arc<SystemMailer>>,
    pub image_uploader: Option<Arc<ImageUploader>>,
    pub login_limiter: LoginRateLimiter,
}
