//! Table listing endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};
use std::sync::Arc;

use super::DashboardState;
use crate::database::traits::DatabaseProvider;
use crate::schema::{ColumnsResponse, TablesResponse};
use crate::Error;

/// Handler for GET /api/tables
///
/// Returns the names of all tables in the connected database, as reported
/// by the database itself.
pub async fn list_tables_handler<DB: DatabaseProvider>(
    State(state): State<Arc<DashboardState<DB>>>,
) -> Result<Json<TablesResponse>, Error> {
    let tables = state.database.list_tables().await.map_err(Error::Query)?;
    Ok(Json(TablesResponse { tables }))
}

/// Handler for GET /api/tables/{name}/columns
///
/// Returns the column names of a table in definition order. The search view
/// uses these as suggestions for the free-text column input.
pub async fn table_columns_handler<DB: DatabaseProvider>(
    State(state): State<Arc<DashboardState<DB>>>,
    Path(table_name): Path<String>,
) -> Result<Json<ColumnsResponse>, Error> {
    let table = state
        .database
        .resolve_table(&table_name)
        .await
        .map_err(Error::Query)?;
    let columns = state
        .database
        .table_columns(&table)
        .await
        .map_err(Error::Query)?;

    Ok(Json(ColumnsResponse { table, columns }))
}
