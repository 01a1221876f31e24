//! Configuration loading
//!
//! Resolves database connection settings from command line overrides,
//! environment variables (optionally read from a .env file first) and the
//! per-database defaults.

use std::{env, fmt, path::Path};

use tracing::{debug, error, trace, warn};

use crate::prelude::TablegenError;

/// Supported database kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Postgres,
    Mysql,
}

impl DbKind {
    /// Standard port of the database server
    pub fn default_port(self) -> u16 {
        match self {
            DbKind::Postgres => 5432,
            DbKind::Mysql => 3306,
        }
    }
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbKind::Postgres => f.write_str("pg"),
            DbKind::Mysql => f.write_str("mysql"),
        }
    }
}

/// Values given explicitly on the command line. These win over the
/// environment.
#[derive(Debug, Default, Clone)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Database connection configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub kind: DbKind,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub schema: String,
    pub user: String,
    pub password: String,
}

impl DbConfig {
    /// Resolve configuration using `lookup` for environment variables
    ///
    /// Recognized variables:
    /// - DB_HOST (default: 127.0.0.1)
    /// - DB_PORT (default: standard port of `kind`)
    /// - DB_NAME (default: postgres)
    /// - DB_SCHEMA (default: public)
    /// - DB_USER (default: postgres)
    /// - DB_PASSWORD (default: empty)
    pub fn from_lookup<F>(
        kind: DbKind,
        overrides: ConnectionOverrides,
        lookup: F,
    ) -> Result<Self, TablegenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |value: Option<String>, key: &str, default: &str| {
            value.or_else(|| lookup(key)).unwrap_or_else(|| {
                trace!(key = ?key, "Not set, using default");
                default.to_string()
            })
        };

        let port = match overrides.port {
            Some(port) => port,
            None => match lookup("DB_PORT") {
                Some(port_str) => port_str.parse::<u16>().map_err(|e| {
                    error!(port = ?port_str, error = ?e, "Invalid DB_PORT value");
                    TablegenError::Config("DB_PORT must be a valid port number".to_string())
                })?,
                None => kind.default_port(),
            },
        };

        let config = Self {
            kind,
            host: resolve(overrides.host, "DB_HOST", "127.0.0.1"),
            port,
            database: resolve(overrides.database, "DB_NAME", "postgres"),
            schema: resolve(overrides.schema, "DB_SCHEMA", "public"),
            user: resolve(overrides.user, "DB_USER", "postgres"),
            password: resolve(overrides.password, "DB_PASSWORD", ""),
        };

        debug!(
            kind = %config.kind,
            host = ?config.host,
            port = ?config.port,
            database = ?config.database,
            schema = ?config.schema,
            user = ?config.user,
            "Configuration resolved"
        );

        Ok(config)
    }

    /// Resolve configuration from the process environment
    pub fn from_env(kind: DbKind, overrides: ConnectionOverrides) -> Result<Self, TablegenError> {
        Self::from_lookup(kind, overrides, |key| env::var(key).ok())
    }

    /// Load a .env file and then resolve configuration from the environment
    pub fn load(
        env_file: &Path,
        kind: DbKind,
        overrides: ConnectionOverrides,
    ) -> Result<Self, TablegenError> {
        if env_file.exists() {
            debug!(path = ?env_file, "Loading environment file");
            dotenvy::from_path(env_file).map_err(|e| {
                error!(path = ?env_file, error = ?e, "Failed to load environment file");
                TablegenError::Config(format!("Failed to load {}: {}", env_file.display(), e))
            })?;
        } else {
            warn!(path = ?env_file, "Environment file not found, using existing environment");
        }

        Self::from_env(kind, overrides)
    }

    /// Name the metadata queries are scoped to: the schema for Postgres,
    /// the database itself for MySQL.
    pub fn scope(&self) -> &str {
        match self.kind {
            DbKind::Postgres => &self.schema,
            DbKind::Mysql => &self.database,
        }
    }

    /// Describe the connection with the password redacted (for logs)
    pub fn redacted_connection_string(&self) -> String {
        format!(
            "{}://{}:***@{}:{}/{}",
            self.kind, self.user, self.host, self.port, self.database
        )
    }

    /// Build the connection error. Only reports whether a password was
    /// supplied, never the password itself.
    pub fn connection_failure(&self, reason: impl fmt::Display) -> TablegenError {
        let using_password = if self.password.is_empty() { "no" } else { "yes" };
        TablegenError::Connection(format!(
            "Connection to database (type={:?}, user={:?}, database={:?}, host='{}:{}', using password: {}) failed: {}",
            self.kind.to_string(),
            self.user,
            self.database,
            self.host,
            self.port,
            using_password,
            reason
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn sample_config(password: &str) -> DbConfig {
        DbConfig {
            kind: DbKind::Postgres,
            host: "localhost".to_string(),
            port: 5432,
            database: "mydb".to_string(),
            schema: "public".to_string(),
            user: "myuser".to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_defaults_postgres() {
        let config =
            DbConfig::from_lookup(DbKind::Postgres, ConnectionOverrides::default(), lookup_from(&[]))
                .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "postgres");
        assert_eq!(config.schema, "public");
        assert_eq!(config.user, "postgres");
        assert_eq!(config.password, "");
    }

    #[test]
    fn test_default_port_follows_kind() {
        let config =
            DbConfig::from_lookup(DbKind::Mysql, ConnectionOverrides::default(), lookup_from(&[]))
                .unwrap();

        assert_eq!(config.port, 3306);
    }

    #[test]
    fn test_environment_values() {
        let lookup = lookup_from(&[
            ("DB_HOST", "db.example.com"),
            ("DB_PORT", "5433"),
            ("DB_NAME", "shop"),
            ("DB_PASSWORD", "secret"),
        ]);
        let config =
            DbConfig::from_lookup(DbKind::Postgres, ConnectionOverrides::default(), lookup)
                .unwrap();

        assert_eq!(config.host, "db.example.com");
        assert_eq!(config.port, 5433);
        assert_eq!(config.database, "shop");
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn test_overrides_win_over_environment() {
        let lookup = lookup_from(&[("DB_HOST", "env-host"), ("DB_PORT", "not_a_number")]);
        let overrides = ConnectionOverrides {
            host: Some("cli-host".to_string()),
            port: Some(6000),
            ..Default::default()
        };
        let config = DbConfig::from_lookup(DbKind::Postgres, overrides, lookup).unwrap();

        assert_eq!(config.host, "cli-host");
        assert_eq!(config.port, 6000);
    }

    #[test]
    fn test_invalid_port() {
        let lookup = lookup_from(&[("DB_PORT", "not_a_number")]);
        let result = DbConfig::from_lookup(DbKind::Postgres, ConnectionOverrides::default(), lookup);

        let err = result.unwrap_err();
        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn test_scope_per_kind() {
        let mut config = sample_config("");
        assert_eq!(config.scope(), "public");

        config.kind = DbKind::Mysql;
        assert_eq!(config.scope(), "mydb");
    }

    #[test]
    fn test_redacted_connection_string() {
        let conn_str = sample_config("secret").redacted_connection_string();

        assert!(!conn_str.contains("secret"));
        assert!(conn_str.contains("***"));
    }

    #[test]
    fn test_connection_failure_redacts_password() {
        let message = sample_config("secret")
            .connection_failure("refused")
            .to_string();

        assert!(!message.contains("secret"));
        assert!(message.contains("using password: yes"));
        assert!(message.contains("host='localhost:5432'"));

        let message = sample_config("").connection_failure("refused").to_string();
        assert!(message.contains("using password: no"));
    }
}
