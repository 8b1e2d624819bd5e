//! SQLite database provider implementation
//!
//! Mirrors the MySQL provider against a local SQLite file or an in-memory
//! database. Useful for demos and for exercising the dashboard without a
//! MySQL server.

use crate::connection::ConnectionManager;
use crate::database::traits::{ContainsFilter, DatabaseError, DatabaseProvider};
use crate::schema::{InsertResponse, PatientRecord};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Column, Connection, Row, TypeInfo, ValueRef};

/// SQLite database provider
pub struct SqliteProvider {
    connections: ConnectionManager<SqliteConnectOptions>,
}

impl SqliteProvider {
    /// Create a new SQLite provider
    ///
    /// # Arguments
    ///
    /// * `connections` - Manager owning the memoized connection
    pub fn new(connections: ConnectionManager<SqliteConnectOptions>) -> Self {
        Self { connections }
    }

    /// The connection manager backing this provider
    pub fn connections(&self) -> &ConnectionManager<SqliteConnectOptions> {
        &self.connections
    }

    /// Quote an identifier (table or column name) to prevent SQL injection
    ///
    /// SQLite uses double quotes for identifiers. This function escapes any
    /// double quotes in the identifier by doubling them.
    fn quote_identifier(identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    fn select_sql(table: &str, filter: Option<&ContainsFilter>, limit: u64) -> String {
        let mut sql = format!("SELECT * FROM {}", Self::quote_identifier(table));
        if let Some(filter) = filter {
            sql.push_str(&format!(
                " WHERE {} LIKE ? ESCAPE '\\'",
                Self::quote_identifier(&filter.column)
            ));
        }
        sql.push_str(&format!(" LIMIT {}", limit));
        sql
    }

    fn insert_sql(table: &str) -> String {
        format!(
            "INSERT INTO {} (name, age, phone, diagnosis) VALUES (?, ?, ?, ?)",
            Self::quote_identifier(table)
        )
    }

    /// Convert a SQLite row to a JSON object
    fn row_to_json(row: &SqliteRow) -> Result<Value, DatabaseError> {
        let mut map = serde_json::Map::new();

        for column in row.columns() {
            let value = Self::extract_column_value(row, column)?;
            map.insert(column.name().to_string(), value);
        }

        Ok(Value::Object(map))
    }

    /// Extract a column value from a SQLite row and convert to JSON
    fn extract_column_value(
        row: &SqliteRow,
        column: &sqlx::sqlite::SqliteColumn,
    ) -> Result<Value, DatabaseError> {
        let index = column.ordinal();

        if row
            .try_get_raw(index)
            .map_err(|e| DatabaseError::Query(e.to_string()))?
            .is_null()
        {
            return Ok(Value::Null);
        }

        // SQLite reports affinities: INTEGER, REAL, TEXT, BLOB, NULL
        match column.type_info().name() {
            "INTEGER" | "BIGINT" | "INT" => {
                if let Ok(value) = row.try_get::<i64, _>(index) {
                    return Ok(Value::Number(value.into()));
                }
            }
            "REAL" | "FLOAT" | "DOUBLE" => {
                if let Ok(value) = row.try_get::<f64, _>(index) {
                    if let Some(number) = serde_json::Number::from_f64(value) {
                        return Ok(Value::Number(number));
                    }
                }
            }
            "BOOLEAN" | "BOOL" => {
                if let Ok(value) = row.try_get::<bool, _>(index) {
                    return Ok(Value::Bool(value));
                }
            }
            "BLOB" => {
                if let Ok(value) = row.try_get::<Vec<u8>, _>(index) {
                    return Ok(Value::String(format!("[BLOB: {} bytes]", value.len())));
                }
            }
            _ => {
                if let Ok(value) = row.try_get::<String, _>(index) {
                    return Ok(Value::String(value));
                }
            }
        }

        // Fallback: try common types in order
        if let Ok(value) = row.try_get_unchecked::<i64, _>(index) {
            return Ok(Value::Number(value.into()));
        }
        if let Ok(value) = row.try_get_unchecked::<f64, _>(index) {
            if let Some(number) = serde_json::Number::from_f64(value) {
                return Ok(Value::Number(number));
            }
        }
        if let Ok(value) = row.try_get_unchecked::<String, _>(index) {
            return Ok(Value::String(value));
        }

        Ok(Value::Null)
    }
}

#[async_trait]
impl DatabaseProvider for SqliteProvider {
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        let connection = self.connections.get_connection().await?;
        let mut connection = connection.lock().await;

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&mut *connection)
        .await?;

        Ok(tables)
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>, DatabaseError> {
        let connection = self.connections.get_connection().await?;
        let mut connection = connection.lock().await;

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
                .bind(table)
                .fetch_all(&mut *connection)
                .await?;

        Ok(columns)
    }

    async fn select_rows(
        &self,
        table: &str,
        filter: Option<&ContainsFilter>,
        limit: u64,
    ) -> Result<Vec<Value>, DatabaseError> {
        let sql = Self::select_sql(table, filter, limit);
        tracing::debug!(%sql, "selecting rows");

        let connection = self.connections.get_connection().await?;
        let mut connection = connection.lock().await;

        let mut query = sqlx::query(&sql);
        if let Some(filter) = filter {
            query = query.bind(&filter.pattern);
        }
        let rows = query.fetch_all(&mut *connection).await?;

        rows.iter().map(Self::row_to_json).collect()
    }

    async fn insert_patient(
        &self,
        table: &str,
        record: &PatientRecord,
    ) -> Result<InsertResponse, DatabaseError> {
        let sql = Self::insert_sql(table);

        let connection = self.connections.get_connection().await?;
        let mut connection = connection.lock().await;

        let mut transaction = connection.begin().await?;
        let result = sqlx::query(&sql)
            .bind(&record.name)
            .bind(record.age)
            .bind(&record.phone)
            .bind(&record.diagnosis)
            .execute(&mut *transaction)
            .await?;
        transaction.commit().await?;

        Ok(InsertResponse {
            table: table.to_string(),
            affected_rows: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        })
    }

    fn is_connected(&self) -> bool {
        self.connections.is_connected()
    }
}
