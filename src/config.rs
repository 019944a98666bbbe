use std::net::IpAddr;

use axum::http::HeaderValue;
use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub session_ttl_hours: i64,
    pub invitation_ttl_hours: i64,
    pub require_email_verification: bool,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub cors_origin: Option<HeaderValue>,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
    pub image_cdn: Option<ImageCdnConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct ImageCdnConfig {
    pub api_url: String,
    pub api_token: String,
    pub variant: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let host: IpAddr = env_or("TRADEBASE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid TRADEBASE_HOST: {e}"))?;

        let port: u16 = env_or("TRADEBASE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid TRADEBASE_PORT: {e}"))?;

        let base_url = env_or("TRADEBASE_BASE_URL", &format!("http://{host}:{port}"));

        let session_ttl_hours: i64 = env_or("TRADEBASE_SESSION_TTL_HOURS", "168")
            .parse()
            .map_err(|e| format!("Invalid TRADEBASE_SESSION_TTL_HOURS: {e}"))?;

        let invitation_ttl_hours: i64 = env_or("TRADEBASE_INVITATION_TTL_HOURS", "48")
            .parse()
            .map_err(|e| format!("Invalid TRADEBASE_INVITATION_TTL_HOURS: {e}"))?;

        let require_email_verification =
            env_or("TRADEBASE_REQUIRE_EMAIL_VERIFICATION", "false") == "true";

        let max_body_size: usize = env_or("TRADEBASE_MAX_BODY_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid TRADEBASE_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("TRADEBASE_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid TRADEBASE_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cors_origin = match std::env::var("TRADEBASE_CORS_ORIGIN").ok() {
            Some(origin) => Some(
                origin
                    .parse::<HeaderValue>()
                    .map_err(|e| format!("Invalid TRADEBASE_CORS_ORIGIN: {e}"))?,
            ),
            None => None,
        };

        let log_level = env_or("TRADEBASE_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("TRADEBASE_SMTP_HOST").ok(),
            std::env::var("TRADEBASE_SMTP_PORT").ok(),
            std::env::var("TRADEBASE_SMTP_USER").ok(),
            std::env::var("TRADEBASE_SMTP_PASS").ok(),
            std::env::var("TRADEBASE_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid TRADEBASE_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        let image_cdn = match (
            std::env::var("TRADEBASE_IMAGE_API_URL").ok(),
            std::env::var("TRADEBASE_IMAGE_API_TOKEN").ok(),
        ) {
            (Some(api_url), Some(api_token)) => Some(ImageCdnConfig {
                api_url,
                api_token,
                variant: env_or("TRADEBASE_IMAGE_VARIANT", "public"),
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            host,
            port,
            base_url,
            session_ttl_hours,
            invitation_ttl_hours,
            require_email_verification,
            max_body_size,
            trusted_proxies,
            cors_origin,
            log_level,
            smtp,
            image_cdn,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
