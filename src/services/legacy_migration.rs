//! One-shot copy of the legacy store into the target database.
//!
//! The pass runs only against a target without users, copies tables in
//! foreign-key order inside a single transaction, and either commits every
//! row or none.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseTransaction, DbBackend, EntityTrait,
    PaginatorTrait, Statement, TransactionTrait,
};
use tracing::{error, info, instrument, warn};

use crate::config::AppConfig;
use crate::db::{DatabaseTarget, DbPool};
use crate::entities::User;
use crate::errors::ServiceError;
use crate::legacy::{LegacyRow, LegacySource, LegacyStore, TableRows};
use crate::services::legacy_mapping::{self as mapping, RowDefaults};

/// Tables in the order they are copied; parents always precede children.
pub const COPY_ORDER: [&str; 7] = [
    "users",
    "categorias",
    "fornecedores",
    "funcionarios",
    "obras",
    "produtos",
    "movimentacoes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The target already holds at least one user.
    AlreadyPopulated,
    /// No legacy store on disk.
    NoLegacySource,
    /// The legacy file is the target database itself.
    SourceIsTarget,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::AlreadyPopulated => "target already populated",
            SkipReason::NoLegacySource => "no legacy store",
            SkipReason::SourceIsTarget => "legacy store is the target database",
        };
        f.write_str(reason)
    }
}

/// Result of copying a single table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableCopy {
    Copied(u64),
    Absent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub tables: Vec<(&'static str, TableCopy)>,
}

impl MigrationReport {
    /// Rows copied over all tables.
    pub fn total(&self) -> u64 {
        self.tables
            .iter()
            .map(|(_, copy)| match copy {
                TableCopy::Copied(n) => *n,
                TableCopy::Absent => 0,
            })
            .sum()
    }

    pub fn table(&self, name: &str) -> Option<TableCopy> {
        self.tables
            .iter()
            .find(|(table, _)| *table == name)
            .map(|(_, copy)| *copy)
    }

    /// Number of users copied; 0 when the users table was absent.
    pub fn users_copied(&self) -> u64 {
        match self.table("users") {
            Some(TableCopy::Copied(n)) => n,
            _ => 0,
        }
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (table, copy) in &self.tables {
            match copy {
                TableCopy::Copied(n) => writeln!(f, "{:<14} {}", table, n)?,
                TableCopy::Absent => writeln!(f, "{:<14} absent", table)?,
            }
        }
        write!(f, "{:<14} {}", "total", self.total())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationOutcome {
    Migrated(MigrationReport),
    Skipped(SkipReason),
}

impl MigrationOutcome {
    /// True when the target ends up with users because of this pass or
    /// because it already had them.
    pub fn target_has_users(&self) -> bool {
        match self {
            MigrationOutcome::Migrated(report) => report.users_copied() > 0,
            MigrationOutcome::Skipped(reason) => *reason == SkipReason::AlreadyPopulated,
        }
    }
}

/// Copies the legacy store into the target database.
#[derive(Clone)]
pub struct LegacyMigrationService {
    db_pool: Arc<DbPool>,
    legacy_path: PathBuf,
    target_path: Option<PathBuf>,
}

impl LegacyMigrationService {
    pub fn new(db_pool: Arc<DbPool>, legacy_path: PathBuf) -> Self {
        Self {
            db_pool,
            legacy_path,
            target_path: None,
        }
    }

    /// Service reading from the configured legacy path into `target`.
    pub fn from_config(db_pool: Arc<DbPool>, target: &DatabaseTarget, cfg: &AppConfig) -> Self {
        Self::new(db_pool, cfg.legacy_db_path()).with_target_path(target.sqlite_path())
    }

    /// Path of the target when it is an SQLite file, used to refuse copying
    /// a store onto itself.
    pub fn with_target_path(mut self, target_path: Option<PathBuf>) -> Self {
        self.target_path = target_path;
        self
    }

    pub fn legacy_path(&self) -> &Path {
        &self.legacy_path
    }

    /// Runs the migration pass once.
    ///
    /// # Errors
    /// Any read, mapping or write failure rolls the whole pass back and is
    /// returned unchanged.
    #[instrument(skip(self), fields(legacy = %self.legacy_path.display()))]
    pub async fn migrate(&self) -> Result<MigrationOutcome, ServiceError> {
        let db = &*self.db_pool;

        let existing_users = User::find().count(db).await?;
        if existing_users > 0 {
            info!(existing_users, "Target already populated, skipping migration");
            return Ok(MigrationOutcome::Skipped(SkipReason::AlreadyPopulated));
        }

        if self.source_is_target() {
            info!("Legacy store is the target database, skipping migration");
            return Ok(MigrationOutcome::Skipped(SkipReason::SourceIsTarget));
        }

        let store = match LegacySource::open(&self.legacy_path).await? {
            LegacySource::Absent => {
                return Ok(MigrationOutcome::Skipped(SkipReason::NoLegacySource));
            }
            LegacySource::Present(store) => store,
        };

        let start = Instant::now();
        let result = self.copy_all(&store).await;
        histogram!("almox_migration.duration", start.elapsed());

        if let Err(e) = store.close().await {
            warn!("Failed to close legacy store: {}", e);
        }

        match result {
            Ok(report) => {
                counter!("almox_migration.completed", 1);
                info!(total = report.total(), "Legacy migration committed");
                Ok(MigrationOutcome::Migrated(report))
            }
            Err(e) => {
                counter!("almox_migration.failed", 1, "category" => e.category());
                error!("Legacy migration rolled back: {}", e);
                Err(e)
            }
        }
    }

    async fn copy_all(&self, store: &LegacyStore) -> Result<MigrationReport, ServiceError> {
        let txn = self.db_pool.begin().await?;

        match copy_tables(store, &txn).await {
            Ok(report) => {
                txn.commit().await?;
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!("Rollback of legacy migration failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    fn source_is_target(&self) -> bool {
        let Some(target) = &self.target_path else {
            return false;
        };
        match (
            std::fs::canonicalize(&self.legacy_path),
            std::fs::canonicalize(target),
        ) {
            (Ok(legacy), Ok(target)) => legacy == target,
            _ => self.legacy_path == *target,
        }
    }
}

async fn copy_tables(
    store: &LegacyStore,
    txn: &DatabaseTransaction,
) -> Result<MigrationReport, ServiceError> {
    let defaults = RowDefaults::default();
    let mut report = MigrationReport::default();

    for table in COPY_ORDER {
        let rows = match store.fetch_table(table).await? {
            TableRows::Absent => {
                warn!(table, "Legacy table not found, skipping");
                report.tables.push((table, TableCopy::Absent));
                continue;
            }
            TableRows::Present(rows) => rows,
        };

        let copied = copy_rows(txn, table, &rows, &defaults)
            .await
            .map_err(|e| {
                error!(table, "Copying legacy table failed: {}", e);
                e
            })?;
        counter!("almox_migration.rows_copied", copied, "table" => table);
        info!(table, copied, "Copied legacy table");
        report.tables.push((table, TableCopy::Copied(copied)));
    }

    if txn.get_database_backend() == DbBackend::Postgres {
        for (table, copy) in &report.tables {
            if matches!(copy, TableCopy::Copied(n) if *n > 0) {
                advance_sequence(txn, table).await?;
            }
        }
    }

    Ok(report)
}

/// Inserts every row of `table` through its active model so entity
/// validation runs on each one.
async fn copy_rows(
    txn: &DatabaseTransaction,
    table: &str,
    rows: &[LegacyRow],
    defaults: &RowDefaults,
) -> Result<u64, ServiceError> {
    for row in rows {
        match table {
            "users" => {
                mapping::map_user(row, defaults)?.insert(txn).await?;
            }
            "categorias" => {
                mapping::map_category(row)?.insert(txn).await?;
            }
            "fornecedores" => {
                mapping::map_supplier(row)?.insert(txn).await?;
            }
            "funcionarios" => {
                mapping::map_employee(row)?.insert(txn).await?;
            }
            "obras" => {
                mapping::map_work(row)?.insert(txn).await?;
            }
            "produtos" => {
                mapping::map_product(row, defaults)?.insert(txn).await?;
            }
            "movimentacoes" => {
                mapping::map_movement(row, defaults)?.insert(txn).await?;
            }
            other => {
                return Err(ServiceError::InternalError(format!(
                    "no mapping for legacy table {}",
                    other
                )))
            }
        }
    }
    Ok(rows.len() as u64)
}

/// Moves the id sequence of `table` past the highest copied identifier.
async fn advance_sequence(txn: &DatabaseTransaction, table: &str) -> Result<(), ServiceError> {
    let sql = format!(
        "SELECT setval(pg_get_serial_sequence('{table}', 'id'), MAX(id)) FROM \"{table}\""
    );
    txn.execute(Statement::from_string(DbBackend::Postgres, sql))
        .await?;
    Ok(())
}
