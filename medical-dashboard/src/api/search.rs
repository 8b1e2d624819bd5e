//! Record search endpoints

use axum::{extract::State, response::Json};
use std::sync::Arc;

use super::DashboardState;
use crate::database::traits::{resolve_identifier, DatabaseError, DatabaseProvider};
use crate::schema::{RowsResponse, SearchRequest, SearchTablesResponse, SEARCH_LIMIT};
use crate::Error;

/// Handler for GET /api/search/tables
///
/// Returns the fixed set of tables offered by the search view.
pub async fn search_tables_handler<DB: DatabaseProvider>(
    State(state): State<Arc<DashboardState<DB>>>,
) -> Json<SearchTablesResponse> {
    Json(SearchTablesResponse {
        tables: state.search_tables.clone(),
    })
}

/// Handler for POST /api/search
///
/// Finds up to 50 rows whose column contains the given value.
///
/// Request body:
/// ```json
/// {
///   "table": "patients",
///   "column": "name",
///   "value": "Rao"
/// }
/// ```
///
/// The table must be one of the search tables and exist in the database,
/// and the column must exist in that table. The value is always bound as a
/// parameter; an empty value matches every row.
pub async fn search_handler<DB: DatabaseProvider>(
    State(state): State<Arc<DashboardState<DB>>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<RowsResponse>, Error> {
    if resolve_identifier(&state.search_tables, &request.table).is_none() {
        return Err(Error::Search(DatabaseError::NotSearchable(request.table)));
    }

    let response = state
        .database
        .search(&request, SEARCH_LIMIT)
        .await
        .map_err(Error::Search)?;

    tracing::info!(
        table = %response.table,
        column = %request.column,
        matches = response.rows.len(),
        "search completed"
    );
    Ok(Json(response))
}
