//! Request and response types for the dashboard API
//!
//! Field names are serialized in camelCase for the frontend.

use serde::{Deserialize, Serialize};

/// Maximum number of rows returned by the table browser
pub const BROWSE_LIMIT: u64 = 100;

/// Maximum number of rows returned by a search
pub const SEARCH_LIMIT: u64 = 50;

/// Table the sample record is inserted into
pub const SAMPLE_TABLE: &str = "patients";

/// Response from listing tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablesResponse {
    /// Table names as reported by the database
    pub tables: Vec<String>,
}

/// Column names of a single table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnsResponse {
    /// Name of the table
    pub table: String,

    /// Column names in definition order
    pub columns: Vec<String>,
}

/// Rows returned by the browser or the search
///
/// An empty `rows` vector is the "no data" state, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsResponse {
    /// Name of the table the rows came from
    pub table: String,

    /// Column names in definition order
    pub columns: Vec<String>,

    /// One JSON object per row, keyed by column name
    pub rows: Vec<serde_json::Value>,

    /// Row cap applied to this query
    pub limit: u64,
}

/// Search request submitted by the search view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Table to search (one of the configured search tables)
    pub table: String,

    /// Column to match against
    pub column: String,

    /// Substring to look for; empty matches every row
    #[serde(default)]
    pub value: String,
}

/// Tables offered by the search view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTablesResponse {
    pub tables: Vec<String>,
}

/// A patient row as written by the inserter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub name: String,
    pub age: i32,
    pub phone: String,
    pub diagnosis: String,
}

impl PatientRecord {
    /// The fixed example patient inserted by the "Add Record" view
    pub fn sample() -> Self {
        Self {
            name: "Test Patient Local".to_string(),
            age: 35,
            phone: "9876543210".to_string(),
            diagnosis: "Sample Checkup".to_string(),
        }
    }
}

/// Result of a successful insert
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    /// Table the row was written to
    pub table: String,

    /// Number of rows written
    pub affected_rows: u64,

    /// Auto-increment id assigned by the database, if any
    pub last_insert_id: Option<i64>,
}

/// Connection details shown in the status sidebar
///
/// Never carries the password or the API key itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub host: String,
    pub database: String,
    pub user: String,
    pub groq_api_key_loaded: bool,
    pub connected: bool,
}
