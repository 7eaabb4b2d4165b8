//! Named query catalog.
//!
//! Maps stable query names to fixed SQL text. The catalog is built once at
//! startup, every statement is checked to be read-only, and it is shared
//! read-only afterwards.

use std::collections::HashMap;
use std::path::Path;

use crate::errors::{AppError, AppResult};
use crate::utils::SqlValidator;

/// Lookup table from query name to SQL text.
#[derive(Debug, Clone, Default)]
pub struct QueryCatalog {
    queries: HashMap<String, String>,
}

impl QueryCatalog {
    /// Builds a catalog from `(name, sql)` pairs.
    ///
    /// # Errors
    /// Returns `AppError::UnsafeSql` if any statement is not read-only.
    pub fn new<I, K, V>(entries: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut catalog = Self::default();
        catalog.extend(entries)?;
        Ok(catalog)
    }

    /// Adds or replaces entries, validating each statement.
    pub fn extend<I, K, V>(&mut self, entries: I) -> AppResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, sql) in entries {
            let name = name.into();
            let sql = sql.into();
            SqlValidator::validate_read_only(&sql).map_err(|e| match e {
                AppError::UnsafeSql(reason) => {
                    AppError::UnsafeSql(format!("query `{}`: {}", name, reason))
                }
                other => other,
            })?;
            self.queries.insert(name, sql);
        }
        Ok(())
    }

    /// Overrides entries with those found in a JSON object file
    /// (`{"name": "SELECT ..."}`).
    pub fn extend_from_json_file(&mut self, path: impl AsRef<Path>) -> AppResult<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read query catalog {}: {}", path.display(), e))
        })?;
        let entries: HashMap<String, String> = serde_json::from_str(&content).map_err(|e| {
            AppError::Config(format!("invalid query catalog {}: {}", path.display(), e))
        })?;
        self.extend(entries)
    }

    /// SQL text for `name`.
    ///
    /// # Errors
    /// Returns `AppError::UnknownQuery` if the name is not registered.
    pub fn get(&self, name: &str) -> AppResult<&str> {
        self.queries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::UnknownQuery(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
