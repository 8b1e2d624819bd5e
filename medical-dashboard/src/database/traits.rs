//! Database provider trait
//!
//! Providers implement a handful of primitive statements. The operations the
//! dashboard exposes (browse, search, insert) are provided methods built on
//! top of them, so identifier validation happens in one place for every
//! backend.

use crate::connection::ConnectionError;
use crate::schema::{InsertResponse, PatientRecord, RowsResponse, SearchRequest, SAMPLE_TABLE};
use async_trait::async_trait;
use thiserror::Error;

/// A parameter-bound "column contains value" condition
///
/// `column` is always a validated, canonical column name. `pattern` is the
/// LIKE pattern to bind, with wildcards in the searched value escaped by a
/// backslash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainsFilter {
    pub column: String,
    pub pattern: String,
}

impl ContainsFilter {
    /// Build a filter matching rows whose `column` contains `value` literally
    pub fn new(column: impl Into<String>, value: &str) -> Self {
        Self {
            column: column.into(),
            pattern: contains_pattern(value),
        }
    }
}

/// Database provider trait for browsing, searching and inserting records
///
/// Implementations of this trait provide database-specific SQL. Identifiers
/// passed to the primitive methods have already been checked against the
/// live schema.
#[async_trait]
pub trait DatabaseProvider: Send + Sync + 'static {
    /// List all table names in the connected database
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError>;

    /// Column names of `table` in definition order
    ///
    /// Returns an empty vector when the table does not exist.
    async fn table_columns(&self, table: &str) -> Result<Vec<String>, DatabaseError>;

    /// Run `SELECT * FROM table [WHERE column LIKE pattern] LIMIT limit`
    async fn select_rows(
        &self,
        table: &str,
        filter: Option<&ContainsFilter>,
        limit: u64,
    ) -> Result<Vec<serde_json::Value>, DatabaseError>;

    /// Insert one patient row into `table` and commit
    async fn insert_patient(
        &self,
        table: &str,
        record: &PatientRecord,
    ) -> Result<InsertResponse, DatabaseError>;

    /// Whether the underlying connection has been opened
    fn is_connected(&self) -> bool;

    /// Resolve a user-supplied table name against the live table list
    async fn resolve_table(&self, table: &str) -> Result<String, DatabaseError> {
        let tables = self.list_tables().await?;
        resolve_identifier(&tables, table)
            .ok_or_else(|| DatabaseError::TableNotFound(table.to_string()))
    }

    /// Fetch up to `limit` rows of `table`
    ///
    /// An empty table yields an empty `rows` vector.
    async fn fetch_table(&self, table: &str, limit: u64) -> Result<RowsResponse, DatabaseError> {
        let table = self.resolve_table(table).await?;
        let columns = self.table_columns(&table).await?;
        let rows = self.select_rows(&table, None, limit).await?;

        Ok(RowsResponse {
            table,
            columns,
            rows,
            limit,
        })
    }

    /// Find up to `limit` rows whose column contains the requested value
    async fn search(
        &self,
        request: &SearchRequest,
        limit: u64,
    ) -> Result<RowsResponse, DatabaseError> {
        let table = self.resolve_table(&request.table).await?;
        let columns = self.table_columns(&table).await?;
        let column = resolve_identifier(&columns, &request.column).ok_or_else(|| {
            DatabaseError::UnknownColumn {
                table: table.clone(),
                column: request.column.clone(),
            }
        })?;

        // An empty value matches every row, NULLs included, so skip the LIKE
        let filter = (!request.value.is_empty())
            .then(|| ContainsFilter::new(column, &request.value));
        let rows = self.select_rows(&table, filter.as_ref(), limit).await?;

        Ok(RowsResponse {
            table,
            columns,
            rows,
            limit,
        })
    }

    /// Insert the fixed sample patient
    async fn insert_sample(&self) -> Result<InsertResponse, DatabaseError> {
        self.insert_patient(SAMPLE_TABLE, &PatientRecord::sample()).await
    }
}

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The connection could not be opened
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Generic database error, carrying the driver message
    #[error("{0}")]
    Query(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column does not exist in the table
    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// Table is not offered by the search view
    #[error("Table '{0}' is not searchable")]
    NotSearchable(String),

    /// Value could not be converted for display
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::Query(error.to_string())
    }
}

/// Find `requested` among `candidates`
///
/// An exact match wins. Otherwise a case-insensitive match is accepted when
/// it is unambiguous. The canonical spelling from `candidates` is returned.
pub fn resolve_identifier(candidates: &[String], requested: &str) -> Option<String> {
    let requested = requested.trim();
    if requested.is_empty() {
        return None;
    }

    if let Some(exact) = candidates.iter().find(|candidate| *candidate == requested) {
        return Some(exact.clone());
    }

    let mut matches = candidates
        .iter()
        .filter(|candidate| candidate.eq_ignore_ascii_case(requested));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Some(only.clone()),
        _ => None,
    }
}

/// Turn a search value into a LIKE pattern matching it as a literal substring
pub fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for character in value.chars() {
        if matches!(character, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(character);
    }
    pattern.push('%');
    pattern
}
