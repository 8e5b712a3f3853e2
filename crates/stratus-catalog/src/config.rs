//! Service configuration.
//!
//! The catalog reads a TOML file whose `queryAdapter` section names the
//! signing identity and the catalog database. Key names keep the camelCase
//! wire the deployment tooling already speaks. Every required field must
//! be non-empty; validation runs before the core starts.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::adapter::DEFAULT_MAX_CONCURRENT_QUERIES;
use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "queryAdapter")]
    pub query_adapter: QueryAdapterConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryAdapterConfig {
    /// NDN identity outgoing Data is signed with.
    #[serde(rename = "signingId")]
    pub signing_id: String,

    pub database: DatabaseConfig,

    /// Segment cache capacity, in entries.
    #[serde(rename = "cacheCapacity", default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Upper bound on concurrently producing query runs.
    #[serde(rename = "maxConcurrentQueries", default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(rename = "dbServer")]
    pub db_server: String,

    #[serde(rename = "dbPort", default = "default_db_port")]
    pub db_port: u16,

    #[serde(rename = "dbName")]
    pub db_name: String,

    #[serde(rename = "dbUser")]
    pub db_user: String,

    #[serde(rename = "dbPasswd")]
    pub db_passwd: String,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_max_concurrent_queries() -> usize {
    DEFAULT_MAX_CONCURRENT_QUERIES
}

fn default_db_port() -> u16 {
    3306
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.query_adapter.validate()?;
        Ok(config)
    }
}

impl QueryAdapterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require("signingId", &self.signing_id)?;
        require("dbServer", &self.database.db_server)?;
        require("dbName", &self.database.db_name)?;
        require("dbUser", &self.database.db_user)?;
        require("dbPasswd", &self.database.db_passwd)?;
        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::EmptyField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [queryAdapter]
        signingId = "/catalog/lap/operator"
        cacheCapacity = 1000

        [queryAdapter.database]
        dbServer = "db.example.net"
        dbName = "atmos"
        dbUser = "catalog"
        dbPasswd = "hunter2"
    "#;

    #[test]
    fn test_full_config_parses() {
        let config = Config::from_toml_str(FULL).unwrap();
        let adapter = config.query_adapter;
        assert_eq!(adapter.signing_id, "/catalog/lap/operator");
        assert_eq!(adapter.cache_capacity, 1000);
        assert_eq!(adapter.max_concurrent_queries, DEFAULT_MAX_CONCURRENT_QUERIES);
        assert_eq!(adapter.database.db_server, "db.example.net");
        assert_eq!(adapter.database.db_port, 3306);
    }

    #[test]
    fn test_empty_required_field_rejected() {
        let raw = FULL.replace("\"catalog\"", "\"\"");
        match Config::from_toml_str(&raw) {
            Err(ConfigError::EmptyField("dbUser")) => {}
            other => panic!("expected EmptyField(dbUser), got {other:?}"),
        }
    }

    #[test]
    fn test_empty_signing_id_rejected() {
        let raw = FULL.replace("\"/catalog/lap/operator\"", "\"\"");
        assert!(matches!(
            Config::from_toml_str(&raw),
            Err(ConfigError::EmptyField("signingId"))
        ));
    }

    #[test]
    fn test_missing_database_section_rejected() {
        let raw = r#"
            [queryAdapter]
            signingId = "/catalog/lap/operator"
        "#;
        assert!(matches!(
            Config::from_toml_str(raw),
            Err(ConfigError::Parse(_))
        ));
    }
}
