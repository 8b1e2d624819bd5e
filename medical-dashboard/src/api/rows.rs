//! Table browsing endpoint

use axum::{
    extract::{Path, State},
    response::Json,
};
use std::sync::Arc;

use super::DashboardState;
use crate::database::traits::DatabaseProvider;
use crate::schema::{RowsResponse, BROWSE_LIMIT};
use crate::Error;

/// Handler for GET /api/tables/{name}/rows
///
/// Fetches the first 100 rows of a table. The name must be one of the
/// tables the database reports; anything else is a 404.
///
/// Response:
/// ```json
/// {
///   "table": "patients",
///   "columns": ["id", "name", "age"],
///   "rows": [{"id": 1, "name": "Asha Rao", "age": 41}],
///   "limit": 100
/// }
/// ```
///
/// An empty table returns `"rows": []`, which the frontend shows as
/// "No data found in this table".
pub async fn get_rows_handler<DB: DatabaseProvider>(
    State(state): State<Arc<DashboardState<DB>>>,
    Path(table_name): Path<String>,
) -> Result<Json<RowsResponse>, Error> {
    let response = state
        .database
        .fetch_table(&table_name, BROWSE_LIMIT)
        .await
        .map_err(Error::Query)?;

    tracing::debug!(table = %response.table, rows = response.rows.len(), "fetched table rows");
    Ok(Json(response))
}
