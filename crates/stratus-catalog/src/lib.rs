//! # stratus-catalog: the query-serving core
//!
//! Answers NDN catalog queries: a JSON query arrives as the last
//! component of an Interest under `P/query`, is acknowledged, translated
//! to SQL over the catalog table, and the resulting dataset names are
//! streamed as signed, size-capped Data segments under a versioned
//! `P/query-results` name. Segments stay in a bounded LRU cache to answer
//! retrieval Interests, and concurrent identical queries share a single
//! run.

pub mod adapter;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod signer;
pub mod translate;

pub use adapter::{QueryAdapter, PAYLOAD_LIMIT, SEGMENT_FRESHNESS_MS};
pub use backend::{CatalogBackend, MemoryBackend, MySqlBackend, RowStream};
pub use cache::{SegmentCache, DEFAULT_CACHE_CAPACITY};
pub use config::{Config, DatabaseConfig, QueryAdapterConfig};
pub use error::{BackendError, CatalogError, ConfigError, SignError};
pub use signer::{KeyChain, Signer};
pub use translate::{json_to_sql, TranslatedQuery};
