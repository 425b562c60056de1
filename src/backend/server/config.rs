/**
 * Server Configuration
 *
 * This module loads the server configuration from environment variables
 * (optionally seeded from a `.env` file) and opens the PostgreSQL pool.
 *
 * # Configuration Sources
 *
 * | Variable              | Default                 |
 * |-----------------------|-------------------------|
 * | `SERVER_PORT`         | `5000`                  |
 * | `DATABASE_URL`        | unset (database off)    |
 * | `DB_MAX_CONNECTIONS`  | `10`                    |
 * | `JWT_SECRET`          | development fallback    |
 * | `TOKEN_TTL_DAYS`      | `7`                     |
 * | `LOW_STOCK_THRESHOLD` | `10`                    |
 * | `ADMIN_EMAIL`         | unset                   |
 * | `FRONTEND_URL`        | `http://localhost:5173` |
 *
 * # Error Handling
 *
 * Malformed values are configuration errors and stop the server. A missing
 * or unreachable database is not: the server starts without it and database
 * backed endpoints answer `503 Service Unavailable`.
 */

use std::str::FromStr;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "brewmarket-dev-secret-change-in-production";

/// Database configuration result
///
/// Contains the connection pool if the database is configured and reachable.
pub type DatabaseConfig = Option<PgPool>;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    /// Stock level at or below which suppliers are warned after a sale
    pub low_stock_threshold: i32,
    /// Registering with this email grants the admin role
    pub admin_email: Option<String>,
    /// Origin allowed by CORS
    pub frontend_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            database_url: None,
            db_max_connections: 10,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_days: 7,
            low_stock_threshold: 10,
            admin_email: None,
            frontend_url: "http://localhost:5173".to_string(),
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let mut builder = AppConfig::builder();

        builder = builder.port(parse_or(&lookup, "SERVER_PORT", defaults.port)?);
        builder = builder.db_max_connections(parse_or(
            &lookup,
            "DB_MAX_CONNECTIONS",
            defaults.db_max_connections,
        )?);
        builder = builder.token_ttl_days(parse_or(&lookup, "TOKEN_TTL_DAYS", defaults.token_ttl_days)?);
        builder = builder.low_stock_threshold(parse_or(
            &lookup,
            "LOW_STOCK_THRESHOLD",
            defaults.low_stock_threshold,
        )?);

        if let Some(url) = non_empty(&lookup, "DATABASE_URL") {
            builder = builder.database_url(url);
        }
        match non_empty(&lookup, "JWT_SECRET") {
            Some(secret) => builder = builder.jwt_secret(secret),
            None => tracing::warn!("JWT_SECRET not set, using the development secret"),
        }
        if let Some(email) = non_empty(&lookup, "ADMIN_EMAIL") {
            builder = builder.admin_email(email);
        }
        if let Some(url) = non_empty(&lookup, "FRONTEND_URL") {
            builder = builder.frontend_url(url);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }
        if self.token_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "TOKEN_TTL_DAYS",
                value: self.token_ttl_days.to_string(),
            });
        }
        if self.low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue {
                key: "LOW_STOCK_THRESHOLD",
                value: self.low_stock_threshold.to_string(),
            });
        }
        if !(self.frontend_url.starts_with("http://") || self.frontend_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidUrl(self.frontend_url.clone()));
        }
        Ok(())
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match non_empty(lookup, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    port: Option<u16>,
    database_url: Option<String>,
    db_max_connections: Option<u32>,
    jwt_secret: Option<String>,
    token_ttl_days: Option<i64>,
    low_stock_threshold: Option<i32>,
    admin_email: Option<String>,
    frontend_url: Option<String>,
}

impl AppConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn db_max_connections(mut self, max: u32) -> Self {
        self.db_max_connections = Some(max);
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    pub fn token_ttl_days(mut self, days: i64) -> Self {
        self.token_ttl_days = Some(days);
        self
    }

    pub fn low_stock_threshold(mut self, threshold: i32) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }

    pub fn admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_email = Some(email.into());
        self
    }

    pub fn frontend_url(mut self, url: impl Into<String>) -> Self {
        self.frontend_url = Some(url.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            port: self.port.unwrap_or(defaults.port),
            database_url: self.database_url,
            db_max_connections: self.db_max_connections.unwrap_or(defaults.db_max_connections),
            jwt_secret: self.jwt_secret.unwrap_or(defaults.jwt_secret),
            token_ttl_days: self.token_ttl_days.unwrap_or(defaults.token_ttl_days),
            low_stock_threshold: self.low_stock_threshold.unwrap_or(defaults.low_stock_threshold),
            admin_email: self.admin_email,
            frontend_url: self.frontend_url.unwrap_or(defaults.frontend_url),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Load and initialize the database connection pool
///
/// This function:
/// 1. Uses `database_url` from the configuration
/// 2. Creates a PostgreSQL connection pool
/// 3. Runs database migrations
///
/// Returns `None` when no URL is configured or the database cannot be
/// reached. Errors are logged; the server keeps running without a database.
pub async fn load_database(config: &AppConfig) -> DatabaseConfig {
    let database_url = match &config.database_url {
        Some(url) => url,
        None => {
            tracing::warn!("DATABASE_URL not set. Database features will be disabled.");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Database features will be disabled.");
            return None;
        }
    };

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => {
            tracing::info!("Database migrations completed successfully");
        }
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}
