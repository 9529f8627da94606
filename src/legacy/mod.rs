//! Read-only access to the legacy single-file SQLite store.
//!
//! A missing file or table is reported as absence, never as an error. Any
//! failure to read a store that does exist is a
//! [`ServiceError::LegacySource`].

pub mod row;

use std::path::Path;

use metrics::counter;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, QueryResult, Statement};
use tracing::{debug, info, instrument};

use crate::db::{self, url::sqlite_read_only_options, DbConfig};
use crate::errors::ServiceError;

pub use row::{LegacyRow, LegacyValue};

/// Outcome of looking for the legacy store on disk.
#[derive(Debug)]
pub enum LegacySource {
    Absent,
    Present(LegacyStore),
}

/// Outcome of reading one table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRows {
    Absent,
    Present(Vec<LegacyRow>),
}

impl LegacySource {
    /// Opens the store at `path` read-only with a single connection.
    #[instrument(fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<LegacySource, ServiceError> {
        if !path.exists() {
            info!("No legacy store found, nothing to migrate");
            return Ok(LegacySource::Absent);
        }

        let pool = DbConfig {
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let conn = db::connect_sqlite(sqlite_read_only_options(path), &pool)
            .await
            .map_err(ServiceError::legacy)?;
        info!("Opened legacy store");

        Ok(LegacySource::Present(LegacyStore { conn }))
    }
}

/// Open handle on a legacy store. Dropping it releases the connection.
#[derive(Debug)]
pub struct LegacyStore {
    conn: DatabaseConnection,
}

impl LegacyStore {
    /// Reads every row of `table`.
    pub async fn fetch_table(&self, table: &str) -> Result<TableRows, ServiceError> {
        if !self.table_exists(table).await? {
            debug!(table, "Legacy table not found");
            return Ok(TableRows::Absent);
        }

        let columns = self.column_names(table).await?;
        if columns.is_empty() {
            return Ok(TableRows::Present(Vec::new()));
        }

        let select_list = columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let column = quote_ident(column);
                format!("typeof({column}) AS t{i}, {column} AS v{i}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT {} FROM {}", select_list, quote_ident(table));

        let results = self
            .conn
            .query_all(Statement::from_string(DbBackend::Sqlite, sql))
            .await
            .map_err(ServiceError::legacy)?;

        let rows = results
            .iter()
            .map(|result| decode_row(table, &columns, result))
            .collect::<Result<Vec<_>, _>>()?;

        counter!("almox_legacy.rows_read", rows.len() as u64, "table" => table.to_string());
        debug!(table, rows = rows.len(), "Read legacy table");

        Ok(TableRows::Present(rows))
    }

    /// Releases the connection.
    pub async fn close(self) -> Result<(), ServiceError> {
        self.conn.close().await.map_err(ServiceError::legacy)
    }

    async fn table_exists(&self, table: &str) -> Result<bool, ServiceError> {
        let found = self
            .conn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                [table.into()],
            ))
            .await
            .map_err(ServiceError::legacy)?;
        Ok(found.is_some())
    }

    async fn column_names(&self, table: &str) -> Result<Vec<String>, ServiceError> {
        let results = self
            .conn
            .query_all(Statement::from_string(
                DbBackend::Sqlite,
                format!("PRAGMA table_info({})", quote_ident(table)),
            ))
            .await
            .map_err(ServiceError::legacy)?;

        results
            .iter()
            .map(|r| r.try_get::<String>("", "name").map_err(ServiceError::legacy))
            .collect()
    }
}

fn decode_row(
    table: &str,
    columns: &[String],
    result: &QueryResult,
) -> Result<LegacyRow, ServiceError> {
    let mut values = Vec::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        let storage: String = result
            .try_get("", &format!("t{i}"))
            .map_err(ServiceError::legacy)?;
        let value_col = format!("v{i}");
        let value = match storage.as_str() {
            "integer" => LegacyValue::Integer(result.try_get("", &value_col).map_err(ServiceError::legacy)?),
            "real" => LegacyValue::Real(result.try_get("", &value_col).map_err(ServiceError::legacy)?),
            "text" => LegacyValue::Text(result.try_get("", &value_col).map_err(ServiceError::legacy)?),
            "blob" => LegacyValue::Blob(result.try_get("", &value_col).map_err(ServiceError::legacy)?),
            _ => LegacyValue::Null,
        };
        values.push((column.clone(), value));
    }
    Ok(LegacyRow::new(table, values))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
