pub mod transaction;
pub mod url;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge, histogram};
use sea_orm::sqlx::sqlite::SqliteConnectOptions;
use sea_orm::sqlx::ConnectOptions as _;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};

pub use transaction::with_transaction;
pub use url::{DatabaseTarget, TargetKind};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Base URL of SQLite pools whose file comes from [`SqliteConnectOptions`].
const SQLITE_BY_PATH_URL: &str = "sqlite://";

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// SQLite file opened by path instead of `url`
    pub sqlite_file: Option<PathBuf>,
    /// Maximum number of connections (steady size plus overflow)
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
    /// Ping connections before handing them out
    pub test_before_acquire: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            sqlite_file: None,
            max_connections: 15,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(30),
            test_before_acquire: true,
        }
    }
}

impl DbConfig {
    /// Pool settings for `target`, tuned by `cfg`.
    pub fn for_target(target: &DatabaseTarget, cfg: &AppConfig) -> Self {
        let max_connections = if target.is_single_connection() {
            1
        } else {
            cfg.db_max_connections().max(1)
        };
        Self {
            url: target.url.clone(),
            sqlite_file: target.embedded_file.clone(),
            max_connections,
            min_connections: 1,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
            test_before_acquire: true,
        }
    }
}

/// Establishes a connection pool to the database with custom configuration
///
/// # Errors
/// Returns [`ServiceError::Connectivity`] if the store cannot be reached and
/// [`ServiceError::PoolExhausted`] if no connection is handed out in time.
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!(
        max_connections = config.max_connections,
        acquire_timeout = ?config.acquire_timeout,
        "Configuring database connection"
    );

    if let Some(path) = config
        .sqlite_file
        .clone()
        .or_else(|| url::sqlite_file_path(&config.url))
    {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ServiceError::Configuration(format!(
                    "cannot create directory {} for the SQLite store: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    gauge!("almox_db.max_connections", config.max_connections as f64);

    info!(
        "Connecting to database with max_connections={}",
        config.max_connections
    );

    let connected = match &config.sqlite_file {
        Some(path) => connect_sqlite(url::sqlite_file_options(path), config).await,
        None => Database::connect(pool_options(config.url.clone(), config)).await,
    };

    let db_pool = connected.map_err(|e| {
        error!("Database connection establishment failed: {}", e);
        counter!("almox_db.connection_failures", 1);
        ServiceError::from(e)
    })?;

    info!("Database connection pool established successfully");

    Ok(db_pool)
}

/// Opens a pool on an SQLite file described by `options`, sized by `config`.
///
/// `config.url` is ignored.
pub async fn connect_sqlite(
    options: SqliteConnectOptions,
    config: &DbConfig,
) -> Result<DbPool, DbErr> {
    let mut opt = pool_options(SQLITE_BY_PATH_URL.to_string(), config);
    opt.map_sqlx_sqlite_opts(move |_| options.clone().disable_statement_logging());
    Database::connect(opt).await
}

fn pool_options(url: String, config: &DbConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(url);
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .test_before_acquire(config.test_before_acquire)
        .sqlx_logging(false);
    opt
}

/// Resolves the target from `cfg` and opens a pool for it.
pub async fn establish_connection_from_app_config(
    cfg: &AppConfig,
) -> Result<(DatabaseTarget, DbPool), ServiceError> {
    let target = url::resolve_from_config(cfg)?;
    info!(
        environment = %target.environment,
        url = %target.redacted_url(),
        "Resolved database target"
    );
    let pool = establish_connection_with_config(&DbConfig::for_target(&target, cfg)).await?;
    Ok((target, pool))
}

/// Creates the target tables if they do not exist yet.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Applying target schema");
    let start = std::time::Instant::now();

    let result = crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(ServiceError::from);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!("Target schema ready in {:?}", elapsed),
        Err(e) => error!("Applying target schema failed after {:?}: {}", elapsed, e),
    }

    result
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    debug!("Checking database connection");
    let start = std::time::Instant::now();

    let result = pool.ping().await.map_err(ServiceError::from);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => {
            debug!("Database connection check successful in {:?}", elapsed);
            histogram!("almox_db.connection_latency", elapsed);
        }
        Err(e) => {
            error!(
                "Database connection check failed after {:?}: {}",
                elapsed, e
            );
            counter!("almox_db.connection_failures", 1);
        }
    }

    result
}

/// Closes the database connection pool
pub async fn close_pool(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Closing database connection pool");

    pool.close_by_ref().await.map_err(ServiceError::from)
}
