use serde::Deserialize;

/// Deployment environment; selects cookie strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub session_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Base URL the emailed verification/reset links point at.
    pub frontend_url: String,
    pub environment: Environment,
    /// Outbound email API; when unset, mails are logged instead of sent.
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: String,
    /// Chat-presence registry; when unset, upserts are no-ops.
    pub presence_api_url: Option<String>,
    pub presence_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "chatty".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "chatty-users".into()),
            session_ttl_days: std::env::var("SESSION_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
        };
        let environment = match std::env::var("APP_ENV").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        };
        Ok(Self {
            database_url,
            jwt,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            environment,
            email_api_url: std::env::var("EMAIL_API_URL").ok(),
            email_api_key: std::env::var("EMAIL_API_KEY").ok(),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Chatty <no-reply@chatty.app>".into()),
            presence_api_url: std::env::var("PRESENCE_API_URL").ok(),
            presence_api_key: std::env::var("PRESENCE_API_KEY").ok(),
        })
    }
}
