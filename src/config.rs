use std::env;

const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub email: EmailConfig,
    pub translate: Option<TranslateConfig>,
}

/// Transactional email provider settings. The key and sender stay optional so the
/// server can boot without them; sending then fails with a configuration error.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from_address: Option<String>,
}

/// LibreTranslate-compatible endpoint. Absent means text is stored as entered.
#[derive(Debug, Clone)]
pub struct TranslateConfig {
    pub api_url: String,
    pub api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        Ok(Self {
            port,
            database_url,
            host,
            email: EmailConfig::from_env(),
            translate: TranslateConfig::from_env(),
        })
    }
}

impl EmailConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: non_empty_var("EMAIL_API_URL")
                .unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string()),
            api_key: non_empty_var("RESEND_API_KEY"),
            from_address: non_empty_var("EMAIL_FROM"),
        }
    }
}

impl TranslateConfig {
    pub fn from_env() -> Option<Self> {
        let api_url = non_empty_var("TRANSLATE_API_URL")?;
        Some(Self {
            api_url,
            api_key: non_empty_var("TRANSLATE_API_KEY"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
