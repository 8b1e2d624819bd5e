//! Connection status endpoint

use axum::{extract::State, response::Json};
use std::sync::Arc;

use super::DashboardState;
use crate::config::Secrets;
use crate::database::traits::DatabaseProvider;
use crate::schema::StatusResponse;

/// Non-secret connection details shown in the sidebar
#[derive(Debug, Clone, Default)]
pub struct ConnectionInfo {
    pub host: String,
    pub database: String,
    pub user: String,
    pub groq_api_key_loaded: bool,
}

impl ConnectionInfo {
    /// Pick the displayable fields out of the secrets file
    pub fn from_secrets(secrets: &Secrets) -> Self {
        Self {
            host: secrets.medical_db.host.clone(),
            database: secrets.medical_db.database.clone(),
            user: secrets.medical_db.user.clone(),
            groq_api_key_loaded: secrets.has_api_key(),
        }
    }
}

/// Handler for GET /api/status
///
/// Reports what was loaded from the secrets file and whether the database
/// connection is open.
pub async fn status_handler<DB: DatabaseProvider>(
    State(state): State<Arc<DashboardState<DB>>>,
) -> Json<StatusResponse> {
    let info = &state.connection_info;
    Json(StatusResponse {
        host: info.host.clone(),
        database: info.database.clone(),
        user: info.user.clone(),
        groq_api_key_loaded: info.groq_api_key_loaded,
        connected: state.database.is_connected(),
    })
}
