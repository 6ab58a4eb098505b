/*
 * Responsibility
 * - 環境変数 (.env) から client 設定と upstream (JWKS / tokeninfo) 設定を読み込む
 * - 設定値のバリデーション (不足なら起動失敗)
 * - プロセス起動時に一度だけ読み、以後は不変
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

pub const DEFAULT_APPLICATION_NAME: &str = "Google+ Rust Token Verification";
pub const DEFAULT_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const DEFAULT_TOKENINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/tokeninfo";
pub const DEFAULT_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// OAuth client registration for this deployment.
#[derive(Clone)]
pub struct ClientConfig {
    pub client_id: String,
    // Not used by verification; kept so the registration is complete.
    #[allow(dead_code)]
    pub client_secret: String,
    pub application_name: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the secret
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("application_name", &self.application_name)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub client: ClientConfig,

    pub id_token_issuers: Vec<String>,
    pub id_token_certs_url: Url,
    pub id_token_leeway_seconds: u64,

    pub tokeninfo_url: Url,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (env vars in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(s) => s.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 4567,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = lookup("APP_ENV")
            .map(|v| AppEnv::parse(&v))
            .unwrap_or(AppEnv::Development);

        let cors_allowed_origins = split_list(&lookup("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        let client_id = required(&lookup, "CLIENT_ID")?;
        let client_secret = required(&lookup, "CLIENT_SECRET")?;
        let application_name = lookup("APPLICATION_NAME")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string());

        let id_token_issuers = match lookup("ID_TOKEN_ISSUERS") {
            Some(v) => split_list(&v),
            None => DEFAULT_ISSUERS.iter().map(|s| s.to_string()).collect(),
        };
        if id_token_issuers.is_empty() {
            return Err(ConfigError::Invalid("ID_TOKEN_ISSUERS"));
        }

        let id_token_certs_url = parse_url(
            lookup("ID_TOKEN_CERTS_URL").as_deref(),
            DEFAULT_CERTS_URL,
            "ID_TOKEN_CERTS_URL",
        )?;

        let id_token_leeway_seconds = lookup("ID_TOKEN_LEEWAY_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let tokeninfo_url = parse_url(
            lookup("TOKENINFO_URL").as_deref(),
            DEFAULT_TOKENINFO_URL,
            "TOKENINFO_URL",
        )?;

        let upstream_timeout_seconds = lookup("UPSTREAM_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(10);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            client: ClientConfig {
                client_id,
                client_secret,
                application_name,
            },
            id_token_issuers,
            id_token_certs_url,
            id_token_leeway_seconds,
            tokeninfo_url,
            upstream_timeout: Duration::from_secs(upstream_timeout_seconds),
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_url(raw: Option<&str>, default: &str, key: &'static str) -> Result<Url, ConfigError> {
    Url::parse(raw.unwrap_or(default)).map_err(|_| ConfigError::Invalid(key))
}
