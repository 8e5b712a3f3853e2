//! Error types for the catalog core.

use stratus_ndn::{FaceError, Name, NameError};
use thiserror::Error;

/// Configuration loading and validation failures. These are fatal: the
/// core refuses to start on a bad configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("empty value for \"{0}\" in \"queryAdapter\" section")]
    EmptyField(&'static str),

    #[error("invalid name in configuration: {0}")]
    BadName(#[from] NameError),
}

/// Catalog backend failures. A failed statement aborts the affected run
/// only; other runs are unaffected.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("database error: {0}")]
    Database(#[from] mysql_async::Error),

    #[error("statement rejected: {0}")]
    Rejected(String),

    #[error("backend is closed")]
    Closed,
}

/// Signing failures. Fatal to the affected emission: unsigned Data never
/// leaves the core.
#[derive(Debug, Error)]
pub enum SignError {
    #[error("no identity named {0} in the keychain")]
    UnknownIdentity(Name),
}

/// Top-level failures surfaced to whoever boots the core.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Face(#[from] FaceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
