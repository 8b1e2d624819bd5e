//! MySQL database provider implementation

use crate::connection::ConnectionManager;
use crate::database::traits::{ContainsFilter, DatabaseError, DatabaseProvider};
use crate::schema::{InsertResponse, PatientRecord};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlRow};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::{Column, Connection, Row, TypeInfo, ValueRef};

const LIST_TABLES_QUERY: &str = r#"
    SELECT CAST(TABLE_NAME AS CHAR) AS table_name
    FROM information_schema.TABLES
    WHERE TABLE_SCHEMA = DATABASE()
    ORDER BY TABLE_NAME
"#;

const LIST_COLUMNS_QUERY: &str = r#"
    SELECT CAST(COLUMN_NAME AS CHAR) AS column_name
    FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = DATABASE()
      AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
"#;

/// MySQL database provider
///
/// All statements run on the single connection owned by the
/// [`ConnectionManager`].
pub struct MySqlProvider {
    connections: ConnectionManager<MySqlConnectOptions>,
}

impl MySqlProvider {
    /// Create a new MySQL provider
    ///
    /// # Arguments
    ///
    /// * `connections` - Manager owning the memoized connection
    pub fn new(connections: ConnectionManager<MySqlConnectOptions>) -> Self {
        Self { connections }
    }

    /// The connection manager backing this provider
    pub fn connections(&self) -> &ConnectionManager<MySqlConnectOptions> {
        &self.connections
    }

    /// Run `SELECT 1` to check the session is alive
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        let connection = self.connections.get_connection().await?;
        let mut connection = connection.lock().await;
        sqlx::query("SELECT 1").execute(&mut *connection).await?;
        Ok(())
    }

    /// Quote an identifier with backticks, doubling embedded backticks
    fn quote_identifier(identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }

    /// Build the browse/search statement
    ///
    /// Backslash is MySQL's default LIKE escape character, which is what
    /// [`ContainsFilter`] patterns use.
    fn select_sql(table: &str, filter: Option<&ContainsFilter>, limit: u64) -> String {
        let mut sql = format!("SELECT * FROM {}", Self::quote_identifier(table));
        if let Some(filter) = filter {
            sql.push_str(&format!(
                " WHERE {} LIKE ?",
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

    /// Convert a MySQL row to a JSON object
    fn row_to_json(row: &MySqlRow) -> Result<Value, DatabaseError> {
        let mut map = serde_json::Map::new();

        for column in row.columns() {
            let value = Self::extract_column_value(row, column.ordinal())?;
            map.insert(column.name().to_string(), value);
        }

        Ok(Value::Object(map))
    }

    /// Extract a column value from a MySQL row and convert to JSON
    fn extract_column_value(row: &MySqlRow, index: usize) -> Result<Value, DatabaseError> {
        if row
            .try_get_raw(index)
            .map_err(|e| DatabaseError::Query(e.to_string()))?
            .is_null()
        {
            return Ok(Value::Null);
        }

        let column = &row.columns()[index];
        let type_name = column.type_info().name();
        let decoded = Self::decode_typed(row, index, ColumnKind::from_type_name(type_name))
            .or_else(|| Self::decode_fallback(row, index));

        column_to_json(column.name(), type_name, decoded)
    }

    fn decode_typed(row: &MySqlRow, index: usize, kind: ColumnKind) -> Option<Decoded> {
        match kind {
            ColumnKind::Bool => row.try_get::<bool, _>(index).ok().map(Decoded::Bool),
            ColumnKind::Signed => row.try_get::<i64, _>(index).ok().map(Decoded::Signed),
            ColumnKind::Unsigned => row.try_get::<u64, _>(index).ok().map(Decoded::Unsigned),
            ColumnKind::Year => row
                .try_get::<u16, _>(index)
                .ok()
                .map(|value| Decoded::Unsigned(value.into())),
            ColumnKind::Float => row
                .try_get::<f32, _>(index)
                .ok()
                .map(|value| Decoded::Float(value.into())),
            ColumnKind::Double => row.try_get::<f64, _>(index).ok().map(Decoded::Float),
            // Keep precision: DECIMAL arrives as text on the wire
            ColumnKind::Decimal => row
                .try_get_unchecked::<String, _>(index)
                .ok()
                .map(Decoded::Text),
            ColumnKind::Date => row.try_get::<NaiveDate, _>(index).ok().map(Decoded::Date),
            ColumnKind::DateTime => row
                .try_get::<NaiveDateTime, _>(index)
                .ok()
                .map(Decoded::DateTime),
            ColumnKind::Timestamp => row
                .try_get::<DateTime<Utc>, _>(index)
                .ok()
                .map(Decoded::Timestamp),
            ColumnKind::Time => row.try_get::<NaiveTime, _>(index).ok().map(Decoded::Time),
            ColumnKind::Json => row.try_get::<Value, _>(index).ok().map(Decoded::Json),
            ColumnKind::Blob => row.try_get::<Vec<u8>, _>(index).ok().map(Decoded::Bytes),
            ColumnKind::Text => row.try_get::<String, _>(index).ok().map(Decoded::Text),
        }
    }

    /// Fallback for anything the type name did not settle
    fn decode_fallback(row: &MySqlRow, index: usize) -> Option<Decoded> {
        if let Ok(value) = row.try_get_unchecked::<String, _>(index) {
            return Some(Decoded::Text(value));
        }
        row.try_get_unchecked::<Vec<u8>, _>(index)
            .ok()
            .map(|bytes| Decoded::Text(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// How a MySQL column is decoded, derived from its type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Bool,
    Signed,
    Unsigned,
    Year,
    Float,
    Double,
    Decimal,
    Date,
    DateTime,
    Timestamp,
    Time,
    Json,
    Blob,
    Text,
}

impl ColumnKind {
    fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "BOOLEAN" => Self::Bool,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => Self::Signed,
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" | "BIT" => Self::Unsigned,
            "YEAR" => Self::Year,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "DECIMAL" => Self::Decimal,
            "DATE" => Self::Date,
            "DATETIME" => Self::DateTime,
            "TIMESTAMP" => Self::Timestamp,
            "TIME" => Self::Time,
            "JSON" => Self::Json,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => Self::Blob,
            _ => Self::Text,
        }
    }
}

/// A non-NULL column value as decoded from the row
#[derive(Debug, Clone, PartialEq)]
enum Decoded {
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Time(NaiveTime),
    Json(Value),
    Bytes(Vec<u8>),
}

/// Render a decoded column value for display
///
/// `None` means no decoder accepted the value.
fn column_to_json(
    column: &str,
    type_name: &str,
    decoded: Option<Decoded>,
) -> Result<Value, DatabaseError> {
    let Some(decoded) = decoded else {
        return Err(DatabaseError::Serialization(format!(
            "cannot display column '{column}' of type {type_name}"
        )));
    };

    Ok(match decoded {
        Decoded::Bool(value) => Value::Bool(value),
        Decoded::Signed(value) => Value::Number(value.into()),
        Decoded::Unsigned(value) => Value::Number(value.into()),
        Decoded::Float(value) => serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string())),
        Decoded::Text(value) => Value::String(value),
        Decoded::Date(value) => Value::String(value.to_string()),
        Decoded::DateTime(value) => Value::String(value.format("%Y-%m-%d %H:%M:%S").to_string()),
        Decoded::Timestamp(value) => Value::String(value.format("%Y-%m-%d %H:%M:%S").to_string()),
        Decoded::Time(value) => Value::String(value.to_string()),
        Decoded::Json(value) => value,
        Decoded::Bytes(bytes) => Value::String(format!("[BLOB: {} bytes]", bytes.len())),
    })
}

#[async_trait]
impl DatabaseProvider for MySqlProvider {
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        let connection = self.connections.get_connection().await?;
        let mut connection = connection.lock().await;

        let tables: Vec<String> = sqlx::query_scalar(LIST_TABLES_QUERY)
            .fetch_all(&mut *connection)
            .await?;

        Ok(tables)
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>, DatabaseError> {
        let connection = self.connections.get_connection().await?;
        let mut connection = connection.lock().await;

        let columns: Vec<String> = sqlx::query_scalar(LIST_COLUMNS_QUERY)
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

        // Dropping the transaction without commit rolls it back
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
            last_insert_id: i64::try_from(result.last_insert_id()).ok(),
        })
    }

    fn is_connected(&self) -> bool {
        self.connections.is_connected()
    }
}
