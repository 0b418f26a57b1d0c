use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    /// Operator mailbox for out-of-stock notices.
    pub admin_email: String,
    pub result_per_page: u64,
    pub upload_dir: PathBuf,
    pub image_root: PathBuf,
    pub image_base_url: String,
    pub otp_cooldown: Duration,
    pub otp_ttl: Duration,
    pub reset_token_ttl: Duration,
    /// Front-end page that accepts `/<token>?email=<email>`.
    pub password_reset_url: String,
    pub smtp: Option<SmtpSettings>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.is_empty() => Some(SmtpSettings {
                host,
                port: parse_or("SMTP_PORT", 587),
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from: env::var("SMTP_FROM")
                    .unwrap_or_else(|_| "Storefront <noreply@localhost>".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", 24),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@localhost".to_string()),
            result_per_page: parse_or("RESULT_PER_PAGE", 5),
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads/tmp".to_string())
                .into(),
            image_root: env::var("IMAGE_ROOT")
                .unwrap_or_else(|_| "public/images".to_string())
                .into(),
            image_base_url: env::var("IMAGE_BASE_URL").unwrap_or_else(|_| "/images".to_string()),
            otp_cooldown: Duration::from_secs(parse_or("OTP_COOLDOWN_SECS", 60)),
            otp_ttl: Duration::from_secs(parse_or("OTP_TTL_SECS", 300)),
            reset_token_ttl: Duration::from_secs(parse_or("RESET_TOKEN_TTL_SECS", 900)),
            password_reset_url: env::var("PASSWORD_RESET_URL")
                .unwrap_or_else(|_| "http://localhost:3000/password/reset".to_string()),
            smtp,
        })
    }

    /// Settings for tests and local runs without a `.env`.
    pub fn for_tests() -> Self {
        Self {
            database_url: String::new(),
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_ttl_hours: 1,
            admin_email: "ops@example.com".to_string(),
            result_per_page: 5,
            upload_dir: env::temp_dir().join("storefront-uploads"),
            image_root: env::temp_dir().join("storefront-images"),
            image_base_url: "/images".to_string(),
            otp_cooldown: Duration::from_secs(60),
            otp_ttl: Duration::from_secs(300),
            reset_token_ttl: Duration::from_secs(900),
            password_reset_url: "http://localhost:3000/password/reset".to_string(),
            smtp: None,
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
