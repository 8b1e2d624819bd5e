//! Memoized database connection
//!
//! [`ConnectionManager`] owns exactly one database session. The session is
//! opened on the first call to [`ConnectionManager::get_connection`] and the
//! same handle is returned for the lifetime of the manager. There is no pool,
//! no reconnect and no retry: a failed attempt is reported to the caller, who
//! decides whether to carry on.
//!
//! Statements are serialized through an async mutex around the session, so
//! concurrent requests never interleave on the wire.

use sqlx::ConnectOptions;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};

#[cfg(feature = "mysql")]
use crate::config::DatabaseSettings;

/// Fixed timeout for opening the connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared handle to the single session
pub type SharedConnection<C> = Arc<Mutex<C>>;

/// Errors raised while opening the connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection to {target} timed out after {} seconds", .timeout.as_secs())]
    Timeout { target: String, timeout: Duration },

    #[error("database connection to {target} failed: {message}")]
    Failed { target: String, message: String },
}

/// Owns a single lazily-opened database connection
pub struct ConnectionManager<O: ConnectOptions> {
    options: O,
    target: String,
    connection: OnceCell<SharedConnection<O::Connection>>,
}

impl<O> ConnectionManager<O>
where
    O: ConnectOptions,
    O::Connection: Sized,
{
    /// Create a manager that will connect with `options`
    ///
    /// `target` is a human readable description of the database used in
    /// logs and error messages. It must not contain credentials.
    pub fn new(options: O, target: impl Into<String>) -> Self {
        Self {
            options,
            target: target.into(),
            connection: OnceCell::new(),
        }
    }

    /// Return the shared connection, opening it on first use
    pub async fn get_connection(&self) -> Result<SharedConnection<O::Connection>, ConnectionError> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                tracing::info!(target_database = %self.target, "opening database connection");

                let connection = tokio::time::timeout(CONNECT_TIMEOUT, self.options.connect())
                    .await
                    .map_err(|_| ConnectionError::Timeout {
                        target: self.target.clone(),
                        timeout: CONNECT_TIMEOUT,
                    })?
                    .map_err(|error| ConnectionError::Failed {
                        target: self.target.clone(),
                        message: error.to_string(),
                    })?;

                tracing::info!(target_database = %self.target, "database connected");
                Ok::<_, ConnectionError>(Arc::new(Mutex::new(connection)))
            })
            .await?;

        Ok(Arc::clone(connection))
    }

    /// Whether the connection has been opened
    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    /// Description of the database this manager connects to
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl<O: ConnectOptions> fmt::Debug for ConnectionManager<O> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConnectionManager")
            .field("target", &self.target)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

#[cfg(feature = "mysql")]
impl ConnectionManager<sqlx::mysql::MySqlConnectOptions> {
    /// Create a manager for the MySQL database described by `settings`
    pub fn mysql(settings: &DatabaseSettings) -> Self {
        let options = sqlx::mysql::MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database)
            .charset(&settings.charset);

        let target = format!(
            "mysql://{}@{}:{}/{}",
            settings.user, settings.host, settings.port, settings.database
        );

        Self::new(options, target)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use sqlx::sqlite::SqliteConnectOptions;
    use std::str::FromStr;

    fn memory_manager() -> ConnectionManager<SqliteConnectOptions> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").expect("parse options");
        ConnectionManager::new(options, "sqlite::memory:")
    }

    #[tokio::test]
    async fn test_connection_is_memoized() {
        let manager = memory_manager();
        assert!(!manager.is_connected());

        let first = manager.get_connection().await.expect("first connection");
        let second = manager.get_connection().await.expect("second connection");

        assert!(manager.is_connected());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_state_survives_between_calls() {
        let manager = memory_manager();

        {
            let connection = manager.get_connection().await.expect("connection");
            let mut connection = connection.lock().await;
            sqlx::query("CREATE TABLE marker (id INTEGER)")
                .execute(&mut *connection)
                .await
                .expect("create table");
        }

        // A fresh in-memory connection would not see the table
        let connection = manager.get_connection().await.expect("connection");
        let mut connection = connection.lock().await;
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'marker'",
        )
        .fetch_one(&mut *connection)
        .await
        .expect("count tables");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_failed_connection_is_reported() {
        let options = SqliteConnectOptions::new()
            .filename("/nonexistent-directory/medical.db")
            .create_if_missing(false);
        let manager = ConnectionManager::new(options, "missing sqlite file");

        let error = manager.get_connection().await.unwrap_err();
        assert!(matches!(error, ConnectionError::Failed { .. }));
        assert!(error.to_string().contains("missing sqlite file"));
        assert!(!manager.is_connected());
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn test_mysql_target_hides_password() {
        let settings: DatabaseSettings = toml::from_str(
            r#"
            host = "db.local"
            user = "clinic"
            password = "hunter2"
            database = "medical"
            "#,
        )
        .expect("parse settings");

        let manager = ConnectionManager::mysql(&settings);
        assert_eq!(manager.target(), "mysql://clinic@db.local:3306/medical");
        assert!(!format!("{manager:?}").contains("hunter2"));
    }
}
