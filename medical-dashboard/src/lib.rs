//! # medical-dashboard
//!
//! A single-page dashboard for browsing, searching and inserting medical
//! records in a MySQL database, mountable as an Axum router.
//!
//! ## Features
//!
//! - Table browser (first 100 rows of any table)
//! - Substring search over a column of the patients, appointments or doctors tables (50 rows)
//! - One-click insert of a sample patient record
//! - Connection status sidebar
//! - MySQL in production, SQLite for local use and tests
//!
//! ## Security Warning
//!
//! **This is an operator tool for trusted networks only!**
//!
//! - No authentication/authorization built-in
//! - Database error messages are shown to the user verbatim
//! - Exposes the contents of every table the configured user can read
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::Router;
//! use medical_dashboard::{ConnectionManager, DashboardLayer, MySqlProvider, Secrets};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let secrets = Secrets::load(".dashboard/secrets.toml").unwrap();
//!     let provider = MySqlProvider::new(ConnectionManager::mysql(&secrets.medical_db));
//!
//!     let app = Router::new()
//!         .merge(DashboardLayer::from_secrets(&secrets, Arc::new(provider)).into_router());
//!
//!     // Serve the application...
//! }
//! ```

use axum::http::StatusCode;
use thiserror::Error;

// Public modules
pub mod api;
pub mod config;
pub mod connection;
pub mod database;
pub mod frontend;
pub mod layer;
pub mod schema;

// Public exports
pub use api::status::ConnectionInfo;
pub use config::{ConfigurationError, DatabaseSettings, Secrets, ServerSettings};
pub use connection::{ConnectionError, ConnectionManager};
pub use layer::DashboardLayer;
pub use schema::{PatientRecord, RowsResponse, SearchRequest};

// Re-export database providers
pub use database::traits::{DatabaseError, DatabaseProvider};

#[cfg(feature = "mysql")]
pub use database::mysql::MySqlProvider;

#[cfg(feature = "sqlite")]
pub use database::sqlite::SqliteProvider;

/// A failed user action, tagged with the view that triggered it
///
/// These errors are scoped to a single request; the user may retry the
/// action by hand.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Error reading data: {0}")]
    Query(DatabaseError),

    #[error("Search error: {0}")]
    Search(DatabaseError),

    #[error("Insert error: {0}")]
    Insert(DatabaseError),
}

impl Error {
    /// The database error underneath
    pub fn source_error(&self) -> &DatabaseError {
        match self {
            Error::Query(error) | Error::Search(error) | Error::Insert(error) => error,
        }
    }

    /// HTTP status used when reporting this error
    pub fn status(&self) -> StatusCode {
        match self.source_error() {
            DatabaseError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            DatabaseError::TableNotFound(_) => StatusCode::NOT_FOUND,
            DatabaseError::UnknownColumn { .. } | DatabaseError::NotSearchable(_) => {
                StatusCode::BAD_REQUEST
            }
            DatabaseError::Query(_) | DatabaseError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_prefixes() {
        let error = Error::Search(DatabaseError::UnknownColumn {
            table: "patients".to_string(),
            column: "nmae".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Search error: Unknown column 'nmae' in table 'patients'"
        );
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);

        let error = Error::Insert(DatabaseError::Query("Table 'medical.patients' doesn't exist".to_string()));
        assert_eq!(
            error.to_string(),
            "Insert error: Table 'medical.patients' doesn't exist"
        );
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_table_is_not_found() {
        let error = Error::Query(DatabaseError::TableNotFound("visits".to_string()));
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
    }
}
