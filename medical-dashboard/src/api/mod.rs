//! REST API endpoints
//!
//! This module contains all API endpoint handlers for the dashboard.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::database::traits::DatabaseProvider;
use crate::Error;

pub mod records;
pub mod rows;
pub mod search;
pub mod status;
pub mod tables;

// Re-export handlers for convenience
pub use records::insert_sample_handler;
pub use rows::get_rows_handler;
pub use search::{search_handler, search_tables_handler};
pub use status::{status_handler, ConnectionInfo};
pub use tables::{list_tables_handler, table_columns_handler};

/// Shared state handed to every handler
pub struct DashboardState<DB: DatabaseProvider> {
    /// Database provider owning the single connection
    pub database: Arc<DB>,

    /// Tables selectable in the search view
    pub search_tables: Vec<String>,

    /// Connection details for the status sidebar
    pub connection_info: ConnectionInfo,
}

/// Create the API router with all endpoints
///
/// Note: Axum 0.8 uses {param} syntax instead of :param
pub fn create_api_router<DB: DatabaseProvider>(state: Arc<DashboardState<DB>>) -> Router {
    Router::new()
        .route("/status", get(status_handler::<DB>))
        .route("/tables", get(list_tables_handler::<DB>))
        .route("/tables/{name}/rows", get(get_rows_handler::<DB>))
        .route("/tables/{name}/columns", get(table_columns_handler::<DB>))
        .route("/search/tables", get(search_tables_handler::<DB>))
        .route("/search", post(search_handler::<DB>))
        .route("/records/sample", post(insert_sample_handler::<DB>))
        .with_state(state)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR || status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        (
            status,
            Json(serde_json::json!({
                "error": self.to_string()
            })),
        )
            .into_response()
    }
}
