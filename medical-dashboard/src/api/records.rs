//! Record insertion endpoint

use axum::{extract::State, http::StatusCode, response::Json};
use std::sync::Arc;

use super::DashboardState;
use crate::database::traits::DatabaseProvider;
use crate::schema::InsertResponse;
use crate::Error;

/// Handler for POST /api/records/sample
///
/// Inserts the fixed sample patient into `patients` and commits.
///
/// Response (201):
/// ```json
/// {
///   "table": "patients",
///   "affectedRows": 1,
///   "lastInsertId": 42
/// }
/// ```
pub async fn insert_sample_handler<DB: DatabaseProvider>(
    State(state): State<Arc<DashboardState<DB>>>,
) -> Result<(StatusCode, Json<InsertResponse>), Error> {
    let response = state
        .database
        .insert_sample()
        .await
        .map_err(Error::Insert)?;

    tracing::info!(
        table = %response.table,
        last_insert_id = ?response.last_insert_id,
        "sample record inserted"
    );
    Ok((StatusCode::CREATED, Json(response)))
}
