//! Database connection parameters.

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Environment variables holding the connection parameters.
pub const DB_ENV_VARS: [&str; 5] = ["DB_HOST", "DB_PORT", "DB_USER", "DB_PASSWORD", "DB_DB"];

/// Parameters for opening a database connection.
///
/// Every field is kept as the raw string from the environment; the driver
/// interprets them when connecting.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: String,
    /// Database username.
    pub user: String,
    /// Database password (never serialized).
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Database name.
    pub database: String,
}

impl ConnectionConfig {
    /// Loads `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD` and `DB_DB`.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `AppError::Config` naming every variable that is missing.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing: Vec<&str> = DB_ENV_VARS
            .into_iter()
            .filter(|key| lookup(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "missing environment variables: {}",
                missing.join(", ")
            )));
        }

        let get = |key: &str| lookup(key).unwrap_or_default();
        Ok(Self {
            host: get("DB_HOST"),
            port: get("DB_PORT"),
            user: get("DB_USER"),
            password: get("DB_PASSWORD"),
            database: get("DB_DB"),
        })
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DB_HOST", "abc"),
            ("DB_PORT", "5432"),
            ("DB_USER", "def"),
            ("DB_PASSWORD", "password"),
            ("DB_DB", "db"),
        ])
    }

    #[test]
    fn test_reads_all_variables() {
        let env = env();
        let config = ConnectionConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.host, "abc");
        assert_eq!(config.port, "5432");
        assert_eq!(config.user, "def");
        assert_eq!(config.password, "password");
        assert_eq!(config.database, "db");
    }

    #[test]
    fn test_missing_variables_are_listed() {
        let mut env = env();
        env.remove("DB_PORT");
        env.remove("DB_DB");
        let err = ConnectionConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: missing environment variables: DB_PORT, DB_DB"
        );
    }

    #[test]
    fn test_password_is_hidden() {
        let mut env = env();
        env.insert("DB_PASSWORD", "hunter2");
        let config = ConnectionConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert!(!format!("{:?}", config).contains("hunter2"));
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("password").is_none());
    }
}
