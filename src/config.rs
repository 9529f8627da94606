use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const CONFIG_DIR: &str = "config";
/// Documented default password of the seeded administrative account.
pub const DEFAULT_ADMIN_PASSWORD: &str = "almox";
/// Conventional location of the legacy SQLite file, relative to the app dir.
pub const LEGACY_DB_RELATIVE_PATH: &str = "database/app.db";

/// Deployment environment selected for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnvironment {
    Development,
    Testing,
    Production,
}

impl RunEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunEnvironment::Development => "development",
            RunEnvironment::Testing => "testing",
            RunEnvironment::Production => "production",
        }
    }
}

impl fmt::Display for RunEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunEnvironment {
    type Err = AppConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "default" => Ok(RunEnvironment::Development),
            "testing" | "test" => Ok(RunEnvironment::Testing),
            "production" | "prod" => Ok(RunEnvironment::Production),
            other => Err(AppConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment (development, testing, production)
    #[validate(custom = "validate_environment")]
    pub environment: String,

    /// Target database URL; mandatory in production
    #[serde(default)]
    pub database_url: Option<String>,

    /// Development override of the embedded SQLite store
    #[serde(default)]
    pub dev_database_url: Option<String>,

    /// Directory the conventional relative paths are resolved against
    #[serde(default)]
    pub app_dir: Option<String>,

    /// Explicit location of the legacy SQLite file
    #[serde(default)]
    pub legacy_db_path: Option<String>,

    /// Password given to the seeded administrative account
    #[serde(default = "default_admin_password")]
    #[validate(length(min = 1))]
    pub admin_password: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// DB pool: steady-state size
    #[serde(default = "default_db_pool_size")]
    #[validate(range(min = 1, max = 256))]
    pub db_pool_size: u32,

    /// DB pool: connections allowed above the steady-state size
    #[serde(default = "default_db_max_overflow")]
    #[validate(range(max = 256))]
    pub db_max_overflow: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    #[validate(range(min = 1))]
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// Creates a configuration for the given environment with every other
    /// field at its default.
    pub fn new(environment: RunEnvironment) -> Self {
        Self {
            environment: environment.as_str().to_string(),
            database_url: None,
            dev_database_url: None,
            app_dir: None,
            legacy_db_path: None,
            admin_password: default_admin_password(),
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_json: false,
            db_pool_size: default_db_pool_size(),
            db_max_overflow: default_db_max_overflow(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
        }
    }

    /// Parsed environment tag
    pub fn run_environment(&self) -> Result<RunEnvironment, AppConfigError> {
        self.environment.parse()
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        matches!(self.run_environment(), Ok(RunEnvironment::Production))
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Directory the conventional relative paths are resolved against.
    pub fn app_dir(&self) -> PathBuf {
        match self.app_dir.as_deref().filter(|dir| !dir.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Location of the legacy SQLite file (`<app_dir>/database/app.db` unless overridden).
    pub fn legacy_db_path(&self) -> PathBuf {
        match self.legacy_db_path.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_sqlite_path(&self.app_dir()),
        }
    }

    /// Upper bound of the pool: steady size plus overflow.
    pub fn db_max_connections(&self) -> u32 {
        self.db_pool_size.saturating_add(self.db_max_overflow)
    }
}

/// Conventional embedded store path under an application directory.
pub fn default_sqlite_path(app_dir: &Path) -> PathBuf {
    app_dir.join(LEGACY_DB_RELATIVE_PATH)
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unknown environment `{0}` (expected development, testing or production)")]
    UnknownEnvironment(String),

    #[error("DATABASE_URL is required in production but is not set")]
    MissingDatabaseUrl,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}

fn default_db_pool_size() -> u32 {
    5
}
fn default_db_max_overflow() -> u32 {
    10
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    30
}

fn validate_environment(value: &str) -> Result<(), ValidationError> {
    value.parse::<RunEnvironment>().map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("environment");
        err.message = Some("Must be one of: development, testing, production".into());
        err
    })
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("almox_api={},sea_orm=warn,tower_http=info", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Reads the environment selector: `APP_ENV`, then `RUN_ENV`, then the
/// legacy `FLASK_ENV`.
pub fn selected_environment() -> String {
    ["APP_ENV", "RUN_ENV", "FLASK_ENV"]
        .iter()
        .find_map(|key| env::var(key).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_ENV.to_string())
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
/// 5. The bare `DATABASE_URL`, `DEV_DATABASE_URL` and `ADMIN_PASSWORD` variables
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = selected_environment();
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("environment", run_env.clone())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .set_override_option("database_url", non_empty_env("DATABASE_URL"))?
        .set_override_option("dev_database_url", non_empty_env("DEV_DATABASE_URL"))?
        .set_override_option("admin_password", non_empty_env("ADMIN_PASSWORD"))?
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    if app_config.is_production()
        && app_config
            .database_url
            .as_deref()
            .map_or(true, |url| url.trim().is_empty())
    {
        error!("DATABASE_URL is not configured for the production environment");
        return Err(AppConfigError::MissingDatabaseUrl);
    }

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_tags_parse_case_insensitively() {
        assert_eq!(
            "Production".parse::<RunEnvironment>().unwrap(),
            RunEnvironment::Production
        );
        assert_eq!(
            "testing".parse::<RunEnvironment>().unwrap(),
            RunEnvironment::Testing
        );
        assert_eq!(
            "default".parse::<RunEnvironment>().unwrap(),
            RunEnvironment::Development
        );
        assert!(matches!(
            "staging".parse::<RunEnvironment>(),
            Err(AppConfigError::UnknownEnvironment(_))
        ));
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::new(RunEnvironment::Development);
        assert_eq!(cfg.admin_password, DEFAULT_ADMIN_PASSWORD);
        assert_eq!(cfg.db_pool_size, 5);
        assert_eq!(cfg.db_max_overflow, 10);
        assert_eq!(cfg.db_max_connections(), 15);
        assert_eq!(cfg.db_acquire_timeout_secs, 30);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn legacy_path_is_resolved_under_app_dir() {
        let mut cfg = AppConfig::new(RunEnvironment::Production);
        cfg.app_dir = Some("/srv/almox".into());
        assert_eq!(cfg.legacy_db_path(), PathBuf::from("/srv/almox/database/app.db"));

        cfg.legacy_db_path = Some("/tmp/old.db".into());
        assert_eq!(cfg.legacy_db_path(), PathBuf::from("/tmp/old.db"));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut cfg = AppConfig::new(RunEnvironment::Testing);
        cfg.log_level = "loud".into();
        cfg.db_pool_size = 0;
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("log_level"));
        assert!(errors.field_errors().contains_key("db_pool_size"));
    }
}
