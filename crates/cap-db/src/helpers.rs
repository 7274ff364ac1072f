//! Row parsing and statement-building helpers shared by the repositories.
//!
//! Timestamps are written with [`format_timestamp`] so that text comparison
//! and `ORDER BY` on them follow chronological order. Parsing still accepts
//! `SQLite`'s `datetime('now')` format for rows written by hand.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use libsql::Value;

use crate::error::DatabaseError;

/// Canonical storage format: RFC 3339, UTC, microseconds, `Z` suffix.
#[must_use]
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Truncate to the microsecond precision that [`format_timestamp`] keeps.
#[must_use]
pub fn to_storage_precision(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.trunc_subsecs(6)
}

/// `Utc::now()` at storage precision. Structs returned by a create compare
/// equal to the same rows read back.
#[must_use]
pub fn now_micros() -> DateTime<Utc> {
    to_storage_precision(Utc::now())
}

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// # Errors
///
/// Returns `DatabaseError::Mapping` if the string is neither RFC 3339 nor
/// `%Y-%m-%d %H:%M:%S`.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Mapping(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Mapping` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Parse a TEXT column into a `snake_case` serde enum.
///
/// # Errors
///
/// Returns `DatabaseError::Mapping` if the string matches no variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Mapping(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column errors, so nullable columns go
/// through `Option<String>`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read an INTEGER 0/1 column as `bool`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_bool(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Extract an optional JSON value from a TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Mapping` if a non-empty string is not valid JSON.
pub fn parse_optional_json(s: Option<&str>) -> Result<Option<serde_json::Value>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => {
            let val = serde_json::from_str(s)
                .map_err(|e| DatabaseError::Mapping(format!("Invalid JSON in column: {e}")))?;
            Ok(Some(val))
        }
        _ => Ok(None),
    }
}

/// Convert an optional value to a bind parameter, `NULL` when absent.
pub fn opt_value<T: Into<Value>>(value: Option<T>) -> Value {
    value.map_or(Value::Null, Into::into)
}

/// Numbered placeholders `?{start}, ?{start+1}, ...` for an `IN (...)` list.
#[must_use]
pub fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prefix every column of a `SELECT_COLS` list with a table alias.
#[must_use]
pub fn qualify(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Accumulates `col = ?n` assignments for a partial `UPDATE`.
#[derive(Debug, Default)]
pub struct SetClause {
    sets: Vec<String>,
    params: Vec<Value>,
}

impl SetClause {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        self.params.push(value.into());
        self.sets.push(format!("{column} = ?{}", self.params.len()));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Build `UPDATE {table} SET ... WHERE id = ?n` and its parameters.
    #[must_use]
    pub fn into_update(mut self, table: &str, id: &str) -> (String, Vec<Value>) {
        self.params.push(id.into());
        let sql = format!(
            "UPDATE {table} SET {} WHERE id = ?{}",
            self.sets.join(", "),
            self.params.len()
        );
        (sql, self.params)
    }
}
