//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

/// Deployment mode. Development exposes internal error detail to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Connection settings; only used when the `postgres` feature is on.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub database: Option<DatabaseSettings>,
    /// Lifetime of the `jwt` cookie.
    pub cookie_expires_days: i64,
    pub password_reset_ttl_minutes: i64,
    /// Prefix printed in front of reset tokens in the log notifier.
    pub reset_url_base: Option<String>,
    /// Key rate limits on `X-Forwarded-For`/`Forwarded` instead of the socket
    /// peer. Only enable behind a proxy that overwrites those headers.
    pub trust_proxy: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: Environment::Development,
            database: None,
            cookie_expires_days: 90,
            password_reset_ttl_minutes: 10,
            reset_url_base: None,
            trust_proxy: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseSettings {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS").unwrap_or(20),
            min_connections: parse_var("DB_MIN_CONNECTIONS").unwrap_or(2),
        });

        let environment = match env::var("RUST_ENV").or_else(|_| env::var("APP_ENV")) {
            Ok(v) if v == "production" || v == "prod" => Environment::Production,
            _ => Environment::Development,
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            environment,
            database,
            cookie_expires_days: parse_var("COOKIE_EXPIRES_DAYS")
                .unwrap_or(defaults.cookie_expires_days),
            password_reset_ttl_minutes: parse_var("PASSWORD_RESET_TTL_MINUTES")
                .unwrap_or(defaults.password_reset_ttl_minutes),
            reset_url_base: env::var("RESET_URL_BASE").ok(),
            trust_proxy: parse_var("TRUST_PROXY").unwrap_or(defaults.trust_proxy),
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
