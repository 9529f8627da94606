use sea_orm::error::{ConnAcquireErr, DbErr};
use sea_orm::SqlErr;

/// Failures raised by the bootstrap and migration core.
///
/// Absence of legacy data is not an error: a missing legacy file or table is
/// reported through [`crate::legacy::LegacySource`] and
/// [`crate::legacy::TableRows`].
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database unreachable: {0}")]
    Connectivity(#[source] DbErr),

    #[error("No pooled connection became available within the acquire timeout")]
    PoolExhausted,

    #[error("Legacy store error: {0}")]
    LegacySource(#[source] DbErr),

    #[error("Legacy data mismatch: {0}")]
    Mapping(#[from] MappingError),

    #[error("Database error: {0}")]
    DatabaseError(#[source] DbErr),

    #[error("Seeding failed: {0}")]
    Seeding(#[source] Box<ServiceError>),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A legacy row that cannot be mapped onto its target entity.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MappingError {
    #[error("{table}: required column `{column}` is missing")]
    MissingColumn { table: String, column: String },

    #[error("{table}: required column `{column}` is NULL")]
    NullValue { table: String, column: String },

    #[error("{table}: column `{column}` holds an invalid {expected} value: {value}")]
    InvalidValue {
        table: String,
        column: String,
        expected: &'static str,
        value: String,
    },
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(ConnAcquireErr::Timeout) => ServiceError::PoolExhausted,
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => ServiceError::Connectivity(err),
            other => ServiceError::DatabaseError(other),
        }
    }
}

impl ServiceError {
    /// Wraps a failure coming from the legacy store, keeping acquire timeouts
    /// distinguishable from read failures.
    pub fn legacy(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(ConnAcquireErr::Timeout) => ServiceError::PoolExhausted,
            other => ServiceError::LegacySource(other),
        }
    }

    /// True when the underlying database error is a unique constraint
    /// violation (e.g. a concurrent worker inserted the same username).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            ServiceError::DatabaseError(err) => {
                matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
            }
            _ => false,
        }
    }

    /// Short machine-readable category, used in logs and CLI diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            ServiceError::Configuration(_) => "configuration",
            ServiceError::Connectivity(_) => "connectivity",
            ServiceError::PoolExhausted => "pool_exhausted",
            ServiceError::LegacySource(_) => "legacy_source",
            ServiceError::Mapping(_) => "data_shape",
            ServiceError::DatabaseError(_) => "database",
            ServiceError::Seeding(_) => "seeding",
            ServiceError::InternalError(_) => "internal",
        }
    }
}

impl From<crate::config::AppConfigError> for ServiceError {
    fn from(err: crate::config::AppConfigError) -> Self {
        ServiceError::Configuration(err.to_string())
    }
}
