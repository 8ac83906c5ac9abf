use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secure: bool,
    /// 0 keeps the cookie for the browser session only.
    pub lifetime_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            cookie_name: std::env::var("SESSION_NAME")
                .unwrap_or_else(|_| "WATCHBUDDYSESSID".into()),
            secure: std::env::var("SESSION_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            lifetime_minutes: std::env::var("SESSION_LIFETIME_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(0),
        };
        Ok(Self {
            database_url,
            session,
        })
    }
}
