use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(&'static str),
}

/// Runtime configuration, built once per run in `main` and passed into each
/// component's constructor. No hidden statics.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub ebay: EbayConfig,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub base_url: String,
    pub service_key: String,
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct EbayConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub redirect_uri: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://catalog.db?mode=rwc".to_string()),
            http: HttpConfig {
                timeout_secs: parse_env("HTTP_TIMEOUT_SECS").unwrap_or(30),
                connect_timeout_secs: parse_env("HTTP_CONNECT_TIMEOUT_SECS").unwrap_or(5),
            },
            storage: StorageConfig {
                base_url: require("STORAGE_BASE_URL")?,
                service_key: require("STORAGE_SERVICE_KEY")?,
                bucket: require("STORAGE_BUCKET")?,
            },
            ebay: EbayConfig {
                base_url: env::var("EBAY_BASE_URL")
                    .unwrap_or_else(|_| "https://api.sandbox.ebay.com".to_string()),
                client_id: require("EBAY_CLIENT_ID")?,
                client_secret: require("EBAY_CLIENT_SECRET")?,
                refresh_token: require("EBAY_REFRESH_TOKEN")?,
                redirect_uri: require("EBAY_RU_NAME")?,
            },
        })
    }
}

fn parse_env(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}
