//! Typed access to rows read from the legacy store.
//!
//! The legacy store is SQLite, so values arrive with their dynamic storage
//! class. Accessors convert them on demand and report any mismatch as a
//! [`MappingError`] naming the table and column.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;

use crate::errors::MappingError;

/// Timestamp layouts written by the legacy application.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One value as stored by SQLite.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl LegacyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, LegacyValue::Null)
    }
}

impl fmt::Display for LegacyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyValue::Null => write!(f, "NULL"),
            LegacyValue::Integer(v) => write!(f, "{}", v),
            LegacyValue::Real(v) => write!(f, "{}", v),
            LegacyValue::Text(v) => write!(f, "{:?}", v),
            LegacyValue::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// Ordered column name → value mapping of a single legacy row.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRow {
    table: String,
    columns: Vec<(String, LegacyValue)>,
}

impl LegacyRow {
    pub fn new(table: impl Into<String>, columns: Vec<(String, LegacyValue)>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Raw value of `column`, `None` when the column does not exist.
    pub fn get(&self, column: &str) -> Option<&LegacyValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Value of `column` if it exists and is not NULL.
    fn present(&self, column: &str) -> Option<&LegacyValue> {
        self.get(column).filter(|value| !value.is_null())
    }

    fn required(&self, column: &str) -> Result<&LegacyValue, MappingError> {
        match self.get(column) {
            None => Err(MappingError::MissingColumn {
                table: self.table.clone(),
                column: column.to_string(),
            }),
            Some(LegacyValue::Null) => Err(MappingError::NullValue {
                table: self.table.clone(),
                column: column.to_string(),
            }),
            Some(value) => Ok(value),
        }
    }

    fn invalid(&self, column: &str, expected: &'static str, value: &LegacyValue) -> MappingError {
        MappingError::InvalidValue {
            table: self.table.clone(),
            column: column.to_string(),
            expected,
            value: value.to_string(),
        }
    }

    pub fn text(&self, column: &str) -> Result<Option<String>, MappingError> {
        self.present(column)
            .map(|value| self.to_text(column, value))
            .transpose()
    }

    pub fn require_text(&self, column: &str) -> Result<String, MappingError> {
        let value = self.required(column)?;
        self.to_text(column, value)
    }

    pub fn int(&self, column: &str) -> Result<Option<i32>, MappingError> {
        self.present(column)
            .map(|value| self.to_int(column, value))
            .transpose()
    }

    pub fn require_int(&self, column: &str) -> Result<i32, MappingError> {
        let value = self.required(column)?;
        self.to_int(column, value)
    }

    pub fn real(&self, column: &str) -> Result<Option<f64>, MappingError> {
        self.present(column)
            .map(|value| self.to_real(column, value))
            .transpose()
    }

    pub fn flag(&self, column: &str) -> Result<Option<bool>, MappingError> {
        self.present(column)
            .map(|value| self.to_flag(column, value))
            .transpose()
    }

    pub fn timestamp(&self, column: &str) -> Result<Option<NaiveDateTime>, MappingError> {
        self.present(column)
            .map(|value| self.to_timestamp(column, value))
            .transpose()
    }

    /// Calendar date; a full timestamp is truncated to its date part.
    pub fn date(&self, column: &str) -> Result<Option<NaiveDate>, MappingError> {
        self.present(column)
            .map(|value| self.to_date(column, value))
            .transpose()
    }

    fn to_text(&self, column: &str, value: &LegacyValue) -> Result<String, MappingError> {
        match value {
            LegacyValue::Text(s) => Ok(s.clone()),
            LegacyValue::Integer(i) => Ok(i.to_string()),
            LegacyValue::Real(r) => Ok(r.to_string()),
            LegacyValue::Blob(bytes) => String::from_utf8(bytes.clone())
                .map_err(|_| self.invalid(column, "text", value)),
            LegacyValue::Null => Err(self.invalid(column, "text", value)),
        }
    }

    fn to_int(&self, column: &str, value: &LegacyValue) -> Result<i32, MappingError> {
        let wide = match value {
            LegacyValue::Integer(i) => Some(*i),
            LegacyValue::Real(r) if r.fract() == 0.0 => Some(*r as i64),
            LegacyValue::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        wide.and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| self.invalid(column, "integer", value))
    }

    fn to_real(&self, column: &str, value: &LegacyValue) -> Result<f64, MappingError> {
        let parsed = match value {
            LegacyValue::Real(r) => Some(*r),
            LegacyValue::Integer(i) => Some(*i as f64),
            LegacyValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|r| r.is_finite())
            .ok_or_else(|| self.invalid(column, "number", value))
    }

    fn to_flag(&self, column: &str, value: &LegacyValue) -> Result<bool, MappingError> {
        match value {
            LegacyValue::Integer(i) => Ok(*i != 0),
            LegacyValue::Real(r) => Ok(*r != 0.0),
            LegacyValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "t" | "yes" => Ok(true),
                "0" | "false" | "f" | "no" => Ok(false),
                _ => Err(self.invalid(column, "boolean", value)),
            },
            _ => Err(self.invalid(column, "boolean", value)),
        }
    }

    fn to_timestamp(&self, column: &str, value: &LegacyValue) -> Result<NaiveDateTime, MappingError> {
        match value {
            LegacyValue::Text(s) => {
                let s = s.trim();
                TIMESTAMP_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .or_else(|| {
                        NaiveDate::parse_from_str(s, DATE_FORMAT)
                            .ok()
                            .and_then(|d| d.and_hms_opt(0, 0, 0))
                    })
                    .ok_or_else(|| self.invalid(column, "timestamp", value))
            }
            // Unix seconds
            LegacyValue::Integer(secs) => DateTime::from_timestamp(*secs, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| self.invalid(column, "timestamp", value)),
            _ => Err(self.invalid(column, "timestamp", value)),
        }
    }

    fn to_date(&self, column: &str, value: &LegacyValue) -> Result<NaiveDate, MappingError> {
        if let LegacyValue::Text(s) = value {
            if let Ok(date) = NaiveDate::parse_from_str(s.trim(), DATE_FORMAT) {
                return Ok(date);
            }
        }
        self.to_timestamp(column, value)
            .map(|ts| ts.date())
            .map_err(|_| self.invalid(column, "date", value))
    }
}
