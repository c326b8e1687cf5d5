//! Connection configuration.

use serde::{Deserialize, Serialize};

use crossql_core::{Error, Result};

/// Shape of a connection URI.
pub const URI_HELP: &str = "duckdb://<database>@<dbpath>";

const IN_MEMORY: &str = ":memory:";

/// Where to connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuckDbConfig {
    /// Catalog name.
    pub database: String,
    /// Database file, or `:memory:`.
    pub filepath: String,
}

impl Default for DuckDbConfig {
    fn default() -> Self {
        Self {
            database: String::from("main"),
            filepath: String::from(IN_MEMORY),
        }
    }
}

impl DuckDbConfig {
    /// An on-disk database at `filepath`.
    #[must_use]
    pub fn file(filepath: impl Into<String>) -> Self {
        Self {
            filepath: filepath.into(),
            ..Self::default()
        }
    }

    /// Returns true when the database lives in memory.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.filepath.is_empty() || self.filepath == IN_MEMORY
    }

    /// Parses `duckdb://<database>@<dbpath>`. Both parts are optional.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] for another scheme.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("duckdb://")
            .ok_or_else(|| Error::Connect(format!("Bad URI '{uri}', expected {URI_HELP}")))?;
        let defaults = Self::default();
        let (database, filepath) = match rest.split_once('@') {
            Some((database, filepath)) => (database, filepath),
            None => ("", rest),
        };
        Ok(Self {
            database: if database.is_empty() {
                defaults.database
            } else {
                database.to_owned()
            },
            filepath: if filepath.is_empty() {
                defaults.filepath
            } else {
                filepath.to_owned()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uri() {
        let config = DuckDbConfig::from_uri("duckdb://analytics@/tmp/a.duckdb").unwrap();
        assert_eq!(config.database, "analytics");
        assert_eq!(config.filepath, "/tmp/a.duckdb");
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_from_uri_defaults() {
        let config = DuckDbConfig::from_uri("duckdb://").unwrap();
        assert_eq!(config, DuckDbConfig::default());
        assert!(config.is_in_memory());

        let config = DuckDbConfig::from_uri("duckdb://data.duckdb").unwrap();
        assert_eq!(config.database, "main");
        assert_eq!(config.filepath, "data.duckdb");
    }

    #[test]
    fn test_from_uri_wrong_scheme() {
        let err = DuckDbConfig::from_uri("postgres://x").unwrap_err();
        assert!(matches!(err, Error::Connect(_)));
    }
}
