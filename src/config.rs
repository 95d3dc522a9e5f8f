use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 5000;
const CONFIG_DIR: &str = "config";
const DEV_DEFAULT_JWT_SECRET: &str =
    "this_is_a_development_secret_key_that_is_at_least_64_characters_long_for_testing";

/// Pagination defaults, passed explicitly into list handlers instead of
/// living as ambient globals.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    #[serde(default = "default_page_limit")]
    pub default_limit: u64,
    #[serde(default = "default_max_page_limit")]
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_page_limit(),
        }
    }
}

/// Stock alert thresholds used by dashboard reporting. Per-product low
/// stock uses the product's own min_stock column; these are the global
/// fallbacks for alerting.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StockConfig {
    #[serde(default = "default_low_threshold")]
    pub low_threshold: i32,
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: i32,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            low_threshold: default_low_threshold(),
            critical_threshold: default_critical_threshold(),
        }
    }
}

/// Application configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL (sqlite or postgres)
    pub database_url: String,

    /// JWT secret key (minimum 64 characters)
    #[validate(length(min = 64))]
    pub jwt_secret: String,

    /// JWT expiration time in seconds
    pub jwt_expiration: usize,

    /// JWT issuer claim
    #[serde(default = "default_auth_issuer")]
    pub auth_issuer: String,

    /// JWT audience claim
    #[serde(default = "default_auth_audience")]
    pub auth_audience: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// CORS: allow credentials
    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB connect timeout (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// Request timeout applied by the HTTP layer (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Pagination defaults
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Stock alert thresholds
    #[serde(default)]
    pub stock: StockConfig,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_auth_issuer() -> String {
    "tabacaria-api".to_string()
}
fn default_auth_audience() -> String {
    "tabacaria-clients".to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_page_limit() -> u64 {
    10
}
fn default_max_page_limit() -> u64 {
    100
}
fn default_low_threshold() -> i32 {
    5
}
fn default_critical_threshold() -> i32 {
    2
}

impl AppConfig {
    /// Construct a configuration programmatically (used by tests).
    pub fn new(
        database_url: String,
        jwt_secret: String,
        jwt_expiration: usize,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            auth_issuer: default_auth_issuer(),
            auth_audience: default_auth_audience(),
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            pagination: PaginationConfig::default(),
            stock: StockConfig::default(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
            || self.environment.eq_ignore_ascii_case("test")
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Security constraints that cannot be expressed as field validators.
    pub fn validate_additional_constraints(&self) -> Result<(), AppConfigError> {
        if !self.is_development() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            return Err(AppConfigError::Insecure(
                "the development JWT secret must not be used outside development".to_string(),
            ));
        }
        if self.pagination.max_limit < self.pagination.default_limit {
            return Err(AppConfigError::Insecure(
                "pagination.max_limit must be >= pagination.default_limit".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("insecure configuration: {0}")]
    Insecure(String),
}

/// Load configuration from `config/{default,ENV}.toml` plus `APP__*`
/// environment variables.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // jwt_secret has no default: it must come from a file or APP__JWT_SECRET.
    let config = Config::builder()
        .set_default("database_url", "sqlite://tabacaria.db?mode=rwc")?
        .set_default("jwt_expiration", 3600 * 24 * 30)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET with a secure random string (minimum 64 characters).");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured".into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;
    app_config.validate_additional_constraints()?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

/// Initialize the tracing subscriber. RUST_LOG overrides the configured
/// level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("tabacaria_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".to_string(),
            DEV_DEFAULT_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            5000,
            "test".to_string(),
        )
    }

    #[test]
    fn dev_secret_rejected_outside_development() {
        let mut cfg = test_config();
        cfg.environment = "production".to_string();
        assert!(cfg.validate_additional_constraints().is_err());

        cfg.environment = "development".to_string();
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn pagination_limits_must_be_consistent() {
        let mut cfg = test_config();
        cfg.pagination.default_limit = 50;
        cfg.pagination.max_limit = 10;
        assert!(cfg.validate_additional_constraints().is_err());
    }
}
