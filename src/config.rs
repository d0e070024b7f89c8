use std::{env, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Base URL of the identity service that issued the bearer tokens.
    pub auth_issuer_url: String,
    pub auth_api_key: String,
    pub auth_verify_timeout: Duration,
    /// Flat shipping fee applied to every non-empty cart and order.
    pub shipping_fee: i64,
    pub environment: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = database_url(&lookup)?;
        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("APP_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let auth_issuer_url = lookup("AUTH_ISSUER_URL").context("AUTH_ISSUER_URL is not set")?;
        let auth_api_key = lookup("AUTH_API_KEY").context("AUTH_API_KEY is not set")?;
        let auth_verify_timeout = lookup("AUTH_VERIFY_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5));
        let shipping_fee = lookup("SHIPPING_FEE")
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|fee| *fee >= 0)
            .unwrap_or(100);
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        Ok(Self {
            port,
            database_url,
            host,
            auth_issuer_url,
            auth_api_key,
            auth_verify_timeout,
            shipping_fee,
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Database URL alone, for the migrate and seed binaries.
pub fn database_url_from_env() -> anyhow::Result<String> {
    database_url(|key| env::var(key).ok())
}

fn database_url(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<String> {
    lookup("DATABASE_URL").context("DATABASE_URL is not set")
}
