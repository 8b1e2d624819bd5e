//! DashboardLayer - Main Axum integration layer
//!
//! This module provides the main entry point for mounting the dashboard
//! into an Axum application.

use crate::api::{create_api_router, ConnectionInfo, DashboardState};
use crate::config::{Secrets, DEFAULT_SEARCH_TABLES};
use crate::database::traits::DatabaseProvider;
use crate::frontend::create_frontend_router;
use axum::Router;
use std::sync::Arc;


/// Main layer for mounting the dashboard into an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use axum::Router;
/// use medical_dashboard::{ConnectionManager, DashboardLayer, MySqlProvider, Secrets};
/// use std::sync::Arc;
///
/// # async fn example() {
/// let secrets = Secrets::load(".dashboard/secrets.toml").unwrap();
/// let provider = MySqlProvider::new(ConnectionManager::mysql(&secrets.medical_db));
/// provider.connections().get_connection().await.unwrap();
///
/// let dashboard = DashboardLayer::from_secrets(&secrets, Arc::new(provider));
/// let app: Router = Router::new().merge(dashboard.into_router());
/// # }
/// ```
pub struct DashboardLayer<DB: DatabaseProvider> {
    base_path: String,
    database: Arc<DB>,
    search_tables: Vec<String>,
    connection_info: ConnectionInfo,
}

impl<DB: DatabaseProvider> DashboardLayer<DB> {
    /// Create a new dashboard at the given base path
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the dashboard will be mounted (e.g., "/dashboard")
    /// * `database` - The database provider, shared with the caller if needed
    pub fn new(base_path: impl Into<String>, database: Arc<DB>) -> Self {
        Self {
            base_path: base_path.into(),
            database,
            search_tables: DEFAULT_SEARCH_TABLES
                .iter()
                .map(|table| table.to_string())
                .collect(),
            connection_info: ConnectionInfo::default(),
        }
    }

    /// Create a dashboard configured from the secrets file
    ///
    /// Takes the base path and search tables from the `[server]` section and
    /// the sidebar details from `[medical_db]`.
    pub fn from_secrets(secrets: &Secrets, database: Arc<DB>) -> Self {
        Self::new(secrets.server.base_path.clone(), database)
            .with_search_tables(secrets.server.search_tables.clone())
            .with_connection_info(ConnectionInfo::from_secrets(secrets))
    }

    /// Replace the tables offered by the search view
    pub fn with_search_tables(mut self, tables: Vec<String>) -> Self {
        self.search_tables = tables;
        self
    }

    /// Set the connection details reported by the status endpoint
    pub fn with_connection_info(mut self, info: ConnectionInfo) -> Self {
        self.connection_info = info;
        self
    }

    /// Convert into an Axum Router that can be merged
    ///
    /// The returned router includes:
    /// - Frontend serving at `{base_path}`
    /// - API endpoints at `{base_path}/api/*`
    pub fn into_router(self) -> Router {
        let state = Arc::new(DashboardState {
            database: self.database,
            search_tables: self.search_tables,
            connection_info: self.connection_info,
        });

        let api_router = create_api_router(state);
        let frontend_router = create_frontend_router(self.base_path.clone());

        Router::new()
            .nest(&format!("{}/api", self.base_path), api_router)
            .nest(&self.base_path, frontend_router)
    }
}
