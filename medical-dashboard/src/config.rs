//! Secrets file loading
//!
//! The dashboard reads everything it needs from a single TOML file that is
//! never committed to version control:
//!
//! ```toml
//! groq_api_key = "optional"
//!
//! [medical_db]
//! host = "localhost"
//! user = "root"
//! password = "secret"
//! database = "medical"
//! port = 3306
//! charset = "utf8mb4"
//!
//! [server]
//! address = "127.0.0.1:3000"
//! base_path = "/dashboard"
//! search_tables = ["patients", "appointments", "doctors"]
//! ```
//!
//! Only the `medical_db` section with `host`, `user`, `password` and
//! `database` is required.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the secrets file, relative to the working directory
pub const DEFAULT_SECRETS_PATH: &str = ".dashboard/secrets.toml";

/// Default MySQL port
pub const DEFAULT_PORT: u16 = 3306;

/// Default connection character set
pub const DEFAULT_CHARSET: &str = "utf8mb4";

/// Tables offered by the search view when the secrets file does not override them
pub const DEFAULT_SEARCH_TABLES: [&str; 3] = ["patients", "appointments", "doctors"];

/// Everything loaded from the secrets file
#[derive(Clone, Deserialize)]
pub struct Secrets {
    /// Database credentials
    pub medical_db: DatabaseSettings,

    /// API key for the external assistant service (only reported, never sent anywhere)
    #[serde(default)]
    pub groq_api_key: Option<String>,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,
}

/// Database connection configuration
#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,

    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: u16,

    #[serde(default = "default_charset")]
    pub charset: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Socket address to bind
    #[serde(default = "default_address")]
    pub address: String,

    /// URL path where the dashboard is mounted
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Tables selectable in the search view
    #[serde(default = "default_search_tables")]
    pub search_tables: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: default_address(),
            base_path: default_base_path(),
            search_tables: default_search_tables(),
        }
    }
}

/// Errors raised while loading the secrets file. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("secrets file not found at {path}")]
    Missing { path: PathBuf },

    #[error("could not read secrets file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed secrets file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid secrets: {0}")]
    Invalid(String),
}

impl Secrets {
    /// Load and validate the secrets file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigurationError::Missing {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigurationError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let secrets: Secrets =
            toml::from_str(&contents).map_err(|source| ConfigurationError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        secrets.validate()?;
        Ok(secrets)
    }

    /// Whether an external API key is present and non-blank
    pub fn has_api_key(&self) -> bool {
        self.groq_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let database = &self.medical_db;
        for (key, value) in [
            ("host", &database.host),
            ("user", &database.user),
            ("database", &database.database),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigurationError::Invalid(format!(
                    "medical_db.{key} must not be empty"
                )));
            }
        }

        if database.port == 0 {
            return Err(ConfigurationError::Invalid(
                "medical_db.port must be non-zero".to_string(),
            ));
        }

        // axum cannot nest a router at the root
        let base_path = &self.server.base_path;
        if !base_path.starts_with('/') || base_path == "/" || base_path.ends_with('/') {
            return Err(ConfigurationError::Invalid(format!(
                "server.base_path must look like \"/dashboard\", got {base_path:?}"
            )));
        }

        if self.server.search_tables.is_empty() {
            return Err(ConfigurationError::Invalid(
                "server.search_tables must name at least one table".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Secrets")
            .field("medical_db", &self.medical_db)
            .field("groq_api_key", &self.groq_api_key.as_ref().map(|_| "<redacted>"))
            .field("server", &self.server)
            .finish()
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("charset", &self.charset)
            .finish()
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_charset() -> String {
    DEFAULT_CHARSET.to_string()
}

fn default_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_base_path() -> String {
    "/dashboard".to_string()
}

fn default_search_tables() -> Vec<String> {
    DEFAULT_SEARCH_TABLES.iter().map(|table| table.to_string()).collect()
}

/// Accept the port either as a TOML integer or as a numeric string
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(i64),
        Text(String),
    }

    match PortValue::deserialize(deserializer)? {
        PortValue::Number(number) => u16::try_from(number)
            .map_err(|_| serde::de::Error::custom(format!("port {number} is out of range"))),
        PortValue::Text(text) => text
            .trim()
            .parse::<u16>()
            .map_err(|_| serde::de::Error::custom(format!("port {text:?} is not a number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [medical_db]
        host = "db.local"
        user = "clinic"
        password = "hunter2"
        database = "medical"
    "#;

    fn write_secrets(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write secrets");
        file
    }

    #[test]
    fn test_minimal_secrets_use_defaults() {
        let file = write_secrets(MINIMAL);
        let secrets = Secrets::load(file.path()).expect("load secrets");

        assert_eq!(secrets.medical_db.host, "db.local");
        assert_eq!(secrets.medical_db.port, 3306);
        assert_eq!(secrets.medical_db.charset, "utf8mb4");
        assert!(secrets.groq_api_key.is_none());
        assert!(!secrets.has_api_key());
        assert_eq!(secrets.server.base_path, "/dashboard");
        assert_eq!(
            secrets.server.search_tables,
            vec!["patients", "appointments", "doctors"]
        );
    }

    #[test]
    fn test_full_secrets() {
        let file = write_secrets(
            r#"
            groq_api_key = "gsk_test"

            [medical_db]
            host = "db.local"
            user = "clinic"
            password = "hunter2"
            database = "medical"
            port = "3307"
            charset = "utf8"

            [server]
            address = "0.0.0.0:8080"
            base_path = "/records"
            search_tables = ["patients"]
            "#,
        );
        let secrets = Secrets::load(file.path()).expect("load secrets");

        assert_eq!(secrets.medical_db.port, 3307);
        assert_eq!(secrets.medical_db.charset, "utf8");
        assert!(secrets.has_api_key());
        assert_eq!(secrets.server.address, "0.0.0.0:8080");
        assert_eq!(secrets.server.base_path, "/records");
        assert_eq!(secrets.server.search_tables, vec!["patients"]);
    }

    #[test]
    fn test_missing_file() {
        let directory = tempfile::tempdir().expect("create temp dir");
        let error = Secrets::load(directory.path().join("secrets.toml")).unwrap_err();
        assert!(matches!(error, ConfigurationError::Missing { .. }));
    }

    #[test]
    fn test_missing_required_key_is_malformed() {
        let file = write_secrets(
            r#"
            [medical_db]
            host = "db.local"
            user = "clinic"
            database = "medical"
            "#,
        );
        let error = Secrets::load(file.path()).unwrap_err();
        assert!(matches!(error, ConfigurationError::Malformed { .. }));
        assert!(error.to_string().contains("password"));
    }

    #[test]
    fn test_missing_section_is_malformed() {
        let file = write_secrets("groq_api_key = \"gsk_test\"\n");
        let error = Secrets::load(file.path()).unwrap_err();
        assert!(matches!(error, ConfigurationError::Malformed { .. }));
    }

    #[test]
    fn test_bad_port() {
        let file = write_secrets(&format!("{MINIMAL}\nport = \"mysql\"\n"));
        assert!(matches!(
            Secrets::load(file.path()).unwrap_err(),
            ConfigurationError::Malformed { .. }
        ));

        let file = write_secrets(&format!("{MINIMAL}\nport = 70000\n"));
        assert!(matches!(
            Secrets::load(file.path()).unwrap_err(),
            ConfigurationError::Malformed { .. }
        ));
    }

    #[test]
    fn test_invalid_values() {
        let file = write_secrets(&MINIMAL.replace("db.local", " "));
        assert!(matches!(
            Secrets::load(file.path()).unwrap_err(),
            ConfigurationError::Invalid(_)
        ));

        let file = write_secrets(&format!("{MINIMAL}\n[server]\nbase_path = \"/\"\n"));
        assert!(matches!(
            Secrets::load(file.path()).unwrap_err(),
            ConfigurationError::Invalid(_)
        ));
    }

    #[test]
    fn test_blank_api_key_is_not_loaded() {
        let file = write_secrets(&format!("groq_api_key = \"  \"\n{MINIMAL}"));
        let secrets = Secrets::load(file.path()).expect("load secrets");
        assert!(!secrets.has_api_key());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let file = write_secrets(&format!("groq_api_key = \"gsk_secret\"\n{MINIMAL}"));
        let secrets = Secrets::load(file.path()).expect("load secrets");
        let debug = format!("{secrets:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("gsk_secret"));
        assert!(debug.contains("<redacted>"));
    }
}
